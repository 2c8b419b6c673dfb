use std::{thread::sleep, time::Duration};

use statsd_client::StatsdBuilder;

fn main() {
    tracing_subscriber::fmt::init();

    let mut client = StatsdBuilder::default()
        .with_remote_address("localhost:9125")
        .expect("failed to parse remote address")
        .with_max_retries(3)
        .with_before_retry_callback(|attempt, error| {
            eprintln!("send attempt {attempt} failed: {error}");
        })
        .with_on_exhausted_callback(|attempt, error| {
            eprintln!("dropping payload after {attempt} attempts: {error}");
        })
        .build()
        .expect("failed to build statsd client");

    // Loop over and over, pretending to do some work.
    let mut iteration = 0u64;
    loop {
        client.send("demo.loops:1|c");

        {
            let mut pipeline = client.pipeline();
            pipeline.send("demo.batch.loops:1|c");
            pipeline.send(format!("demo.batch.iteration:{iteration}|g"));
            pipeline.send("demo.batch.delta_ms:250|ms");
        }

        iteration += 1;
        sleep(Duration::from_millis(250));
    }
}
