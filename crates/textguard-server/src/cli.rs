//! Command-line interface

use clap::Parser;
use std::path::PathBuf;
use textguard_classifiers::Backend;

#[derive(Parser, Debug, Clone)]
#[command(name = "textguard-server")]
#[command(about = "TextGuard toxicity classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TEXTGUARD_CONFIG", default_value = "textguard.yaml")]
    pub config: String,

    /// Classifier backend (model or keyword)
    #[arg(short, long, env = "TEXTGUARD_BACKEND", value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// HuggingFace repository of the model to serve
    #[arg(long, env = "TEXTGUARD_MODEL_REPO", conflicts_with = "model_path")]
    pub model_repo: Option<String>,

    /// Local directory of the model to serve
    #[arg(long, env = "TEXTGUARD_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long, env = "TEXTGUARD_HOST")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "TEXTGUARD_PORT")]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["textguard-server"]);
        assert_eq!(cli.config, "textguard.yaml");
        assert!(cli.backend.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_backend_flag() {
        let cli = Cli::parse_from(["textguard-server", "--backend", "keyword"]);
        assert_eq!(cli.backend, Some(Backend::Keyword));

        let cli = Cli::parse_from(["textguard-server", "-b", "fallback"]);
        assert_eq!(cli.backend, Some(Backend::Keyword));

        assert!(Cli::try_parse_from(["textguard-server", "--backend", "regex"]).is_err());
    }

    #[test]
    fn test_model_source_flags_conflict() {
        let result = Cli::try_parse_from([
            "textguard-server",
            "--model-repo",
            "unitary/toxic-bert",
            "--model-path",
            "/models/toxic-bert",
        ]);
        assert!(result.is_err());
    }
}
