//! Centralized installer settings.
//! Upstream endpoints plus the network and file-layout defaults used by the transport and providers.

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REQUEST_RETRIES: u32 = 3;
pub const MAX_TEXT_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;
pub const MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;
pub const USER_AGENT: &str = concat!("anvil-lib/", env!("CARGO_PKG_VERSION"));

// URL Constants
pub const VANILLA_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const PAPER_API_URL: &str = "https://api.papermc.io/v2/projects";
pub const PURPUR_API_URL: &str = "https://api.purpurmc.org/v2/purpur";
pub const FABRIC_META_URL: &str = "https://meta.fabricmc.net/v2/versions";
pub const QUILT_META_URL: &str = "https://meta.quiltmc.org/v3/versions";
pub const FORGE_MAVEN_URL: &str = "https://maven.minecraftforge.net/net/minecraftforge/forge";
pub const NEOFORGE_MAVEN_URL: &str = "https://maven.neoforged.net/releases/net/neoforged/neoforge";

pub fn maven_metadata_url(repo: &str) -> String {
    format!("{}/maven-metadata.xml", repo)
}

// Instance layout
pub const MANIFEST_FILE: &str = "anvil-manifest.json";
pub const SERVER_JAR: &str = "server.jar";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Upper bound for an out-of-process installer run.
pub const INSTALLER_TIMEOUT_SECS: u64 = 30 * 60;
