//! `server.properties` and `eula.txt` handling.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SERVER_PROPERTIES_FILE: &str = "server.properties";
pub const EULA_FILE: &str = "eula.txt";
pub const DEFAULT_SERVER_PORT: u16 = 25565;

/// Key/value pairs in file order.
pub type PropertyList = Vec<(String, String)>;

pub fn parse_properties(content: &str) -> PropertyList {
    let mut props: PropertyList = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        upsert(&mut props, key, value.trim());
    }
    props
}

/// Read a properties file into a map; a missing file yields an empty map.
pub async fn parse_properties_file(path: &Path) -> Result<BTreeMap<String, String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_properties(&content).into_iter().collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn upsert(props: &mut PropertyList, key: &str, value: &str) {
    match props.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => props.push((key.to_string(), value.to_string())),
    }
}

fn render(props: &PropertyList) -> String {
    let mut out = String::new();
    for (key, value) in props {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Write `server.properties`, keeping existing keys and applying `overrides` on top.
///
/// A fresh file starts from `whitelist=true`. An existing file with no overrides is left untouched.
pub async fn write_server_properties(
    instance_dir: &Path,
    overrides: &BTreeMap<String, String>,
) -> Result<PathBuf> {
    let path = instance_dir.join(SERVER_PROPERTIES_FILE);
    let mut props = match tokio::fs::read_to_string(&path).await {
        Ok(_) if overrides.is_empty() => return Ok(path),
        Ok(content) => parse_properties(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No existing {}, applying first-install defaults", SERVER_PROPERTIES_FILE);
            vec![("whitelist".to_string(), "true".to_string())]
        }
        Err(e) => return Err(Error::io(&path, e)),
    };

    for (key, value) in overrides {
        upsert(&mut props, key, value);
    }

    tokio::fs::write(&path, render(&props))
        .await
        .map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

pub async fn write_eula(instance_dir: &Path, accepted: bool) -> Result<PathBuf> {
    let path = instance_dir.join(EULA_FILE);
    let content = format!(
        "# By changing the setting below to TRUE you are indicating your agreement to our EULA (https://aka.ms/MinecraftEULA).\n# Generated {}\neula={}\n",
        chrono::Utc::now().to_rfc3339(),
        accepted
    );
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

/// `(server-ip, server-port)` from the instance's properties, defaulting to `("", 25565)`.
pub async fn read_server_endpoint(instance_dir: &Path) -> Result<(String, u16)> {
    let props = parse_properties_file(&instance_dir.join(SERVER_PROPERTIES_FILE)).await?;
    let host = props.get("server-ip").cloned().unwrap_or_default();
    let port = props
        .get("server-port")
        .and_then(|p| p.parse::<u16>().ok())
        .filter(|p| *p != 0)
        .unwrap_or(DEFAULT_SERVER_PORT);
    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_ignores_comments_and_blank_lines() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(SERVER_PROPERTIES_FILE);
        tokio::fs::write(
            &path,
            "# comment\nserver-ip=play.example.com\nserver-port=25570\n\n! ignored comment\nmotd=Hello world\n",
        )
        .await?;

        let props = parse_properties_file(&path).await?;
        assert_eq!(props.len(), 3);
        assert_eq!(props["server-ip"], "play.example.com");
        assert_eq!(props["server-port"], "25570");
        assert_eq!(props["motd"], "Hello world");
        Ok(())
    }

    #[test]
    fn value_keeps_everything_after_first_equals() {
        let props = parse_properties("motd=a=b\n");
        assert_eq!(props, vec![("motd".to_string(), "a=b".to_string())]);
    }

    #[tokio::test]
    async fn endpoint_defaults_when_missing_or_invalid() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(read_server_endpoint(dir.path()).await?, (String::new(), 25565));

        tokio::fs::write(
            dir.path().join(SERVER_PROPERTIES_FILE),
            "server-ip=mc.example.com\nserver-port=abc\n",
        )
        .await?;
        assert_eq!(
            read_server_endpoint(dir.path()).await?,
            ("mc.example.com".to_string(), 25565)
        );

        tokio::fs::write(dir.path().join(SERVER_PROPERTIES_FILE), "server-port=25570\n").await?;
        assert_eq!(read_server_endpoint(dir.path()).await?, (String::new(), 25570));
        Ok(())
    }

    #[tokio::test]
    async fn fresh_properties_default_to_whitelist() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut overrides = BTreeMap::new();
        overrides.insert("motd".to_string(), "Fresh".to_string());
        write_server_properties(dir.path(), &overrides).await?;

        let props = parse_properties_file(&dir.path().join(SERVER_PROPERTIES_FILE)).await?;
        assert_eq!(props["whitelist"], "true");
        assert_eq!(props["motd"], "Fresh");
        Ok(())
    }

    #[tokio::test]
    async fn existing_properties_are_merged() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(
            dir.path().join(SERVER_PROPERTIES_FILE),
            "whitelist=false\nmotd=Keep me\nmax-players=10\n",
        )
        .await?;
        let mut overrides = BTreeMap::new();
        overrides.insert("max-players".to_string(), "20".to_string());
        write_server_properties(dir.path(), &overrides).await?;

        let content = tokio::fs::read_to_string(dir.path().join(SERVER_PROPERTIES_FILE)).await?;
        assert_eq!(content, "whitelist=false\nmotd=Keep me\nmax-players=20\n");
        Ok(())
    }

    #[tokio::test]
    async fn eula_reflects_flag() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_eula(dir.path(), true).await?;
        let content = tokio::fs::read_to_string(dir.path().join(EULA_FILE)).await?;
        assert!(content.lines().any(|l| l == "eula=true"));

        write_eula(dir.path(), false).await?;
        let content = tokio::fs::read_to_string(dir.path().join(EULA_FILE)).await?;
        assert!(content.lines().any(|l| l == "eula=false"));
        Ok(())
    }
}
