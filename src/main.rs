use anyhow::Context;
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};
use w1_thermostat::config::Config;
use w1_thermostat::delay::StdDelay;
use w1_thermostat::poller::Poller;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.to_string_lossy()))?,
        None => Config::default(),
    };

    // Installed before anything is claimed, so an interrupt can't skip the release below.
    let mut interrupt = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let mut poller = Poller::from_config(&config).context("startup failed")?;

    println!("DS18B20 Temperature Sensor Reading");
    println!("Using sensor at: {}", poller.locator());
    if let (Some(controller), Some(control)) = (poller.controller(), &config.control) {
        println!(
            "Control pins: {}",
            control
                .pins
                .iter()
                .map(|pin| format!("GPIO {}", pin))
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "Temperature threshold: {} {}\u{00B0}F",
            controller.comparison(),
            controller.threshold_fahrenheit()
        );
    }
    println!("Press Ctrl+C to exit");

    let mut delay = StdDelay;
    loop {
        let cycle = poller.poll_once(&mut delay);
        println!("{}", cycle);

        tokio::select! {
            _ = interrupt.recv() => break,
            _ = terminate.recv() => break,
            _ = tokio::time::sleep(config.poll_interval()) => {}
        }
    }

    println!("\nMeasurement stopped by user");
    let controlled = poller.controller().is_some();
    drop(poller);
    if controlled {
        log::info!("Output pins released");
    }
    Ok(())
}
