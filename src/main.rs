use log::{error, LevelFilter};
use mapbench::{BenchConfig, Driver};
use std::process::exit;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let res = Driver::new(BenchConfig::default()).and_then(|driver| driver.run());
    if let Err(e) = res {
        error!("{}", e);
        exit(1);
    }
}
