mod app;
mod battery;

use std::path::Path;

use cogbat_session::{intake, BatteryConfig, Session};

use app::App;

fn main() -> anyhow::Result<()> {
    println!("=== COGNITIVE TASK BATTERY ===");
    println!("Platform: {}", std::env::consts::OS);
    println!("Architecture: {}", std::env::consts::ARCH);
    println!();

    let config = BatteryConfig::load_or_default(Path::new("cogbat.json"))?;

    let Some(participant) = intake::collect_from_stdin()? else {
        println!("Cancelled; no data written.");
        return Ok(());
    };
    println!(
        "Participant {} (condition {}), tasks: {}",
        participant.id,
        participant.condition,
        config.tasks.join(", "),
    );

    let session = Session::new(participant, config);

    cogbat_timing::request_fine_scheduling();
    let result = App::new(session)?.run();
    cogbat_timing::release_fine_scheduling();

    result
}
