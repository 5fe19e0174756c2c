use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use anvil_lib::{InstallRequest, LaunchOptions, LogSink, ServerManager};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: install_server <loader> [minecraft_version] [instance_dir]
    // Downloads real artifacts; may take a few minutes depending on network.
    let mut args = std::env::args().skip(1);
    let loader = args.next().unwrap_or_else(|| "paper".to_string());
    let version = args.next().unwrap_or_else(|| "latest".to_string());
    let tmp = tempfile::tempdir()?;
    let instance_dir = args
        .next()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| tmp.path().join("server"));

    let manager = ServerManager::new()?;
    let catalog = manager.catalog();
    let versions = catalog.list_minecraft_versions(&loader, true, 5).await?;
    println!("Newest {} versions: {:?}", loader, versions);

    let result = manager
        .install(
            InstallRequest::new(&loader, &instance_dir)
                .with_minecraft_version(&version)
                .accept_eula(true),
        )
        .await?;
    println!("Installed into {}", result.instance_dir.display());
    println!("Manifest: {}", result.manifest_path.display());
    for note in &result.notes {
        println!("Note: {}", note);
    }

    let options = LaunchOptions::default().with_memory(Some("1G"), Some("2G"));
    println!("Start command: {:?}", manager.build_start_command(&result.manifest, &options)?);

    let sink: LogSink = Arc::new(|line: &str| println!("[server] {}", line));
    let mut process = manager.start(&result.instance_dir, &options, Some(sink)).await?;
    tokio::time::sleep(Duration::from_secs(30)).await;
    let code = process.stop(Duration::from_secs(30)).await?;
    println!("Server exited with code {}", code);
    Ok(())
}
