//! CLI arguments and server configuration defaults.

use clap::Parser;

pub const DEFAULT_PORT: u16 = 1000;
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_WALLPAPERS_DIR: &str = "wallpapers";
pub const DEFAULT_UPLOAD_MAX_SIZE: usize = 50 * 1024 * 1024;
pub const DEFAULT_UNSPLASH_API_URL: &str = "https://api.unsplash.com";
pub const UNSPLASH_TIMEOUT_SECS: u64 = 30;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "wallpaper-gallery", version, about = "Wallpaper gallery server")]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        env = "GALLERY_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "GALLERY_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "GALLERY_UPLOADS_DIR",
        default_value = DEFAULT_UPLOADS_DIR,
        help = "Directory holding uploaded photos, served at /uploads"
    )]
    pub uploads_dir: String,
    #[arg(
        long,
        env = "GALLERY_WALLPAPERS_DIR",
        default_value = DEFAULT_WALLPAPERS_DIR,
        help = "Directory served read-only at /wallpapers"
    )]
    pub wallpapers_dir: String,
    #[arg(
        long,
        env = "GALLERY_CORS_ORIGINS",
        default_value = "*",
        help = "Comma separated CORS origins, or * for any"
    )]
    pub cors_origins: String,
    #[arg(
        long,
        env = "GALLERY_UPLOAD_MAX_SIZE",
        default_value_t = DEFAULT_UPLOAD_MAX_SIZE,
        help = "Max upload request size in bytes"
    )]
    pub upload_max_size: usize,
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", help = "Unsplash API access key")]
    pub unsplash_access_key: Option<String>,
    #[arg(
        long,
        env = "UNSPLASH_API_URL",
        default_value = DEFAULT_UNSPLASH_API_URL,
        help = "Unsplash API base URL"
    )]
    pub unsplash_api_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["wallpaper-gallery"]).expect("parse");
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.uploads_dir, "uploads");
        assert_eq!(args.wallpapers_dir, "wallpapers");
        assert_eq!(args.cors_origins, "*");
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "wallpaper-gallery",
            "-p",
            "8080",
            "--uploads-dir",
            "/srv/uploads",
            "--unsplash-access-key",
            "key",
        ])
        .expect("parse");
        assert_eq!(args.port, 8080);
        assert_eq!(args.uploads_dir, "/srv/uploads");
        assert_eq!(args.unsplash_access_key.as_deref(), Some("key"));
    }
}
