mod common;

use anvil_lib::game::installer::config::{
    maven_metadata_url, FABRIC_META_URL, FORGE_MAVEN_URL, MANIFEST_FILE, PAPER_API_URL,
    PURPUR_API_URL,
};
use anvil_lib::game::launcher::manifest::{save_manifest, JAVA_PLACEHOLDER};
use anvil_lib::utils::properties::parse_properties_file;
use anvil_lib::{
    ErrorKind, InstallRequest, LaunchOptions, LoaderId, OsType, ServerManager, ServerManifest,
    StartCommands, StopOutcome,
};
use common::{digest_hex, server_bytes, sha256_hex, FakeTransport};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn manager(transport: FakeTransport) -> (ServerManager, Arc<FakeTransport>) {
    let transport = Arc::new(transport);
    (ServerManager::with_transport(transport.clone()), transport)
}

fn paper_transport(jar: &[u8], sha256: &str) -> FakeTransport {
    let builds = format!("{}/paper/versions/1.21.11/builds", PAPER_API_URL);
    FakeTransport::new()
        .with_mojang_version("1.21.11", 21)
        .with_json(
            format!("{}/paper", PAPER_API_URL),
            json!({"versions": ["1.21.10", "1.21.11-pre3", "1.21.11"]}),
        )
        .with_json(
            builds.clone(),
            json!({"builds": [
                {"build": 10, "channel": "experimental", "downloads": {"application": {"name": "paper-1.21.11-10.jar", "sha256": "00"}}},
                {"build": 12, "channel": "default", "downloads": {"application": {"name": "paper-1.21.11-12.jar", "sha256": sha256}}},
                {"build": 11, "channel": "default", "downloads": {"application": {"name": "paper-1.21.11-11.jar", "sha256": "00"}}}
            ]}),
        )
        .with_file(format!("{}/12/downloads/paper-1.21.11-12.jar", builds), jar.to_vec())
}

#[tokio::test]
async fn paper_fresh_install_writes_defaults_and_manifest() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let instance = dir.path().join("paper");
    let jar = server_bytes("paper-12");
    let (manager, transport) = manager(paper_transport(&jar, &sha256_hex(&jar)));

    let result = manager
        .install(InstallRequest::new("PaperMC", &instance).accept_eula(true))
        .await?;

    assert_eq!(result.manifest.loader, LoaderId::Paper);
    assert_eq!(result.manifest.minecraft_version, "1.21.11");
    assert_eq!(result.manifest.build.as_deref(), Some("12"));
    assert_eq!(result.manifest.java_required, Some(21));
    assert!(result.manifest.downloaded_urls[0].ends_with("/builds/12/downloads/paper-1.21.11-12.jar"));
    assert_eq!(result.manifest_path, result.instance_dir.join(MANIFEST_FILE));
    assert_eq!(std::fs::read(result.server_jar.as_ref().unwrap())?, jar);

    let eula = std::fs::read_to_string(result.instance_dir.join("eula.txt"))?;
    assert!(eula.lines().any(|l| l == "eula=true"));
    let props = parse_properties_file(&result.instance_dir.join("server.properties")).await?;
    assert_eq!(props.get("whitelist").map(String::as_str), Some("true"));

    let loaded = manager.load_manifest(&result.instance_dir)?;
    assert_eq!(loaded, result.manifest);
    assert!(transport.requests().iter().all(|u| u.starts_with("https://")));
    Ok(())
}

#[tokio::test]
async fn digest_mismatch_leaves_no_manifest() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let jar = server_bytes("paper-12");
    let (manager, _) = manager(paper_transport(&jar, &sha256_hex(b"something else")));

    let err = manager
        .install(InstallRequest::new("paper", dir.path()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Download);
    assert!(err.to_string().contains("Hash mismatch"));
    assert!(!dir.path().join(MANIFEST_FILE).exists());
    assert!(!dir.path().join("server.jar").exists());
    Ok(())
}

#[tokio::test]
async fn vanilla_install_keeps_existing_properties() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("server.properties"),
        "#Minecraft server properties\nmotd=Hello\nwhitelist=false\n",
    )?;
    let (manager, _) = manager(FakeTransport::new().with_mojang_version("1.21.11", 21));

    let result = manager
        .install(
            InstallRequest::new("vanilla", dir.path())
                .with_minecraft_version("1.21.11")
                .with_property("server-port", "25570"),
        )
        .await?;
    assert_eq!(result.manifest.loader, LoaderId::Vanilla);
    assert_eq!(result.manifest.start.default, ["{java}", "-jar", "server.jar", "nogui"]);

    let props = parse_properties_file(&dir.path().join("server.properties")).await?;
    assert_eq!(props.get("whitelist").map(String::as_str), Some("false"));
    assert_eq!(props.get("motd").map(String::as_str), Some("Hello"));
    assert_eq!(props.get("server-port").map(String::as_str), Some("25570"));
    assert_eq!(manager.server_endpoint(dir.path()).await?, (String::new(), 25570));

    let eula = std::fs::read_to_string(dir.path().join("eula.txt"))?;
    assert!(eula.lines().any(|l| l == "eula=false"));
    Ok(())
}

#[tokio::test]
async fn unknown_minecraft_version_is_a_resolution_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (manager, _) = manager(FakeTransport::new().with_mojang_version("1.21.11", 21));
    let err = manager
        .install(InstallRequest::new("vanilla", dir.path()).with_minecraft_version("0.0.1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VersionResolution);
    assert!(err.to_string().contains("0.0.1"));
    Ok(())
}

#[tokio::test]
async fn purpur_install_verifies_md5() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let jar = server_bytes("purpur-2401");
    let md5 = digest_hex(anvil_lib::DigestAlgorithm::Md5, &jar);
    let transport = FakeTransport::new()
        .with_mojang_version("1.21.11", 21)
        .with_json(PURPUR_API_URL, json!({"versions": ["1.21.10", "1.21.11"]}))
        .with_json(
            format!("{}/1.21.11", PURPUR_API_URL),
            json!({"builds": {"latest": "2401", "all": ["2400", "2401"]}}),
        )
        .with_json(format!("{}/1.21.11/2401", PURPUR_API_URL), json!({"md5": md5}))
        .with_file(format!("{}/1.21.11/2401/download", PURPUR_API_URL), jar.clone());
    let (manager, _) = manager(transport);

    let result = manager.install(InstallRequest::new("purpur", dir.path())).await?;
    assert_eq!(result.manifest.build.as_deref(), Some("2401"));
    assert_eq!(std::fs::read(dir.path().join("server.jar"))?, jar);
    Ok(())
}

#[cfg(unix)]
mod installers {
    use super::*;
    use common::fake_java;

    const FABRIC_INSTALLER_URL: &str =
        "https://maven.fabricmc.net/net/fabricmc/fabric-installer/1.0.1/fabric-installer-1.0.1.jar";

    fn fabric_transport() -> FakeTransport {
        FakeTransport::new()
            .with_mojang_version("1.21.11", 21)
            .with_json(
                format!("{}/game", FABRIC_META_URL),
                json!([
                    {"version": "25w41a", "stable": false},
                    {"version": "1.21.11", "stable": true}
                ]),
            )
            .with_json(
                format!("{}/loader/1.21.11", FABRIC_META_URL),
                json!([
                    {"loader": {"version": "0.17.0-beta.1", "stable": false}},
                    {"loader": {"version": "0.16.14", "stable": true}}
                ]),
            )
            .with_json(
                format!("{}/installer", FABRIC_META_URL),
                json!([
                    {"version": "1.1.0-rc1", "url": "https://maven.fabricmc.net/rc.jar", "stable": false},
                    {"version": "1.0.1", "url": FABRIC_INSTALLER_URL, "stable": true}
                ]),
            )
            .with_file(FABRIC_INSTALLER_URL, b"installer".to_vec())
    }

    #[tokio::test]
    async fn fabric_runs_installer_and_records_launch_jar() -> anyhow::Result<()> {
        let tools = tempfile::tempdir()?;
        let dir = tempfile::tempdir()?;
        let java = fake_java(tools.path(), "echo \"$@\" > installer-args.txt\ntouch fabric-server-launch.jar");
        let (manager, _) = manager(fabric_transport());

        let result = manager
            .install(InstallRequest::new("fabric", dir.path()).with_java_path(java.to_string_lossy()))
            .await?;

        assert_eq!(result.manifest.loader_version.as_deref(), Some("0.16.14"));
        assert_eq!(result.manifest.build.as_deref(), Some("1.0.1"));
        assert_eq!(
            result.manifest.start.default,
            ["{java}", "-jar", "fabric-server-launch.jar", "nogui"]
        );
        assert_eq!(result.notes.len(), 1);

        let args = std::fs::read_to_string(result.instance_dir.join("installer-args.txt"))?;
        assert!(args.contains("server -dir"));
        assert!(args.contains("-mcversion 1.21.11 -loader 0.16.14 -downloadMinecraft"));
        Ok(())
    }

    #[tokio::test]
    async fn failing_installer_surfaces_exit_code_and_output() -> anyhow::Result<()> {
        let tools = tempfile::tempdir()?;
        let dir = tempfile::tempdir()?;
        let java = fake_java(tools.path(), "echo boom >&2\nexit 3");
        let (manager, _) = manager(fabric_transport());

        let err = manager
            .install(InstallRequest::new("fabric", dir.path()).with_java_path(java.to_string_lossy()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Install);
        let message = err.to_string();
        assert!(message.contains("exit code 3"), "{}", message);
        assert!(message.contains("boom"), "{}", message);
        assert!(!dir.path().join(MANIFEST_FILE).exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_launch_jar_is_an_install_error() -> anyhow::Result<()> {
        let tools = tempfile::tempdir()?;
        let dir = tempfile::tempdir()?;
        let java = fake_java(tools.path(), "exit 0");
        let (manager, _) = manager(fabric_transport());

        let err = manager
            .install(InstallRequest::new("fabric", dir.path()).with_java_path(java.to_string_lossy()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Install);
        assert!(err.to_string().contains("fabric-server-launch.jar"));
        Ok(())
    }

    #[tokio::test]
    async fn forge_uses_argfiles() -> anyhow::Result<()> {
        let tools = tempfile::tempdir()?;
        let dir = tempfile::tempdir()?;
        let java = fake_java(tools.path(), "touch run.sh");
        let version = "1.21.11-61.1.1";
        let transport = FakeTransport::new()
            .with_mojang_version("1.21.11", 21)
            .with_text(
                maven_metadata_url(FORGE_MAVEN_URL),
                format!(
                    "<metadata><versioning><release>{v}</release><versions><version>1.21.10-60.0.1</version><version>{v}</version></versions></versioning></metadata>",
                    v = version
                ),
            )
            .with_file(
                format!("{}/{v}/forge-{v}-installer.jar", FORGE_MAVEN_URL, v = version),
                b"forge".to_vec(),
            );
        let (manager, _) = manager(transport);

        let result = manager
            .install(InstallRequest::new("minecraftforge", dir.path()).with_java_path(java.to_string_lossy()))
            .await?;

        assert_eq!(result.manifest.loader, LoaderId::Forge);
        assert_eq!(result.manifest.minecraft_version, "1.21.11");
        assert_eq!(result.manifest.loader_version.as_deref(), Some(version));
        assert_eq!(result.manifest.java_required, Some(21));
        assert!(result.server_jar.is_none());
        assert_eq!(
            result.manifest.start.select(OsType::Windows)[2],
            format!("@libraries/net/minecraftforge/forge/{}/win_args.txt", version)
        );
        Ok(())
    }

    #[tokio::test]
    async fn start_and_graceful_stop() -> anyhow::Result<()> {
        let tools = tempfile::tempdir()?;
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("server.jar"), b"jar")?;
        save_manifest(
            dir.path(),
            &ServerManifest::new(LoaderId::Vanilla, "1.21.11", StartCommands::jar("server.jar")),
        )?;
        let java = fake_java(
            tools.path(),
            "echo \"args: $*\"\nwhile read line; do\n  if [ \"$line\" = \"stop\" ]; then echo stopping; exit 0; fi\n  echo \"got $line\"\ndone",
        );
        let (manager, _) = manager(FakeTransport::new());
        let options = LaunchOptions::new(java.to_string_lossy()).with_memory(None, Some("1G"));

        let mut process = manager.start(dir.path(), &options, None).await?;
        assert!(process.is_running().await?);
        assert_eq!(process.command()[1..], ["-Xmx1G", "-jar", "server.jar", "nogui"]);

        process.send_command("list").await?;
        let (code, outcome) = process.stop_with_outcome(Duration::from_secs(10)).await?;
        assert_eq!(code, 0);
        assert_eq!(outcome, StopOutcome::Graceful);

        let lines = process.recent_lines();
        assert_eq!(lines.first().map(String::as_str), Some("args: -Xmx1G -jar server.jar nogui"));
        assert!(lines.iter().any(|l| l == "got list"));
        assert_eq!(lines.last().map(String::as_str), Some("stopping"));
        Ok(())
    }

    #[tokio::test]
    async fn start_rejects_escaping_jar() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        save_manifest(
            dir.path(),
            &ServerManifest::new(
                LoaderId::Vanilla,
                "1.21.11",
                StartCommands::new([JAVA_PLACEHOLDER, "-jar", "../../evil.jar", "nogui"]),
            ),
        )?;
        let (manager, _) = manager(FakeTransport::new());
        let err = manager
            .start(dir.path(), &LaunchOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Manifest);
        Ok(())
    }
}
