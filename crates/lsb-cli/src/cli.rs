use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lsb", about = "Back up and restore linksets", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with client settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the linksets, prims and textures of a backup
    Inspect(InspectArgs),
    /// Check a backup's structure and companion images
    Verify(VerifyArgs),
    /// Export the linksets of a scene into a backup
    Export(ExportArgs),
    /// Rebuild a backup inside a scene
    Import(ImportArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    pub document: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub document: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Scene JSON describing the world and its selection
    #[arg(long)]
    pub scene: PathBuf,
    /// Path of the backup document to write
    #[arg(long)]
    pub out: PathBuf,
    /// Name stored in the document metadata
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub document: PathBuf,
    /// Scene JSON describing the world to import into
    #[arg(long)]
    pub scene: PathBuf,
    /// Keep the recorded texture ids instead of uploading companion images
    #[arg(long)]
    pub no_reupload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inspect() {
        let cli = Cli::try_parse_from(["lsb", "inspect", "chair.json"]).unwrap();
        if let Command::Inspect(args) = cli.command {
            assert_eq!(args.document, PathBuf::from("chair.json"));
        } else { panic!("wrong command"); }
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["lsb", "verify", "backups/chair.json"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.document, PathBuf::from("backups/chair.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_export() {
        let cli = Cli::try_parse_from([
            "lsb", "export", "--scene", "scene.json", "--out", "out/chair.json", "--name", "Chair",
        ])
        .unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(args.scene, PathBuf::from("scene.json"));
            assert_eq!(args.out, PathBuf::from("out/chair.json"));
            assert_eq!(args.name, Some("Chair".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_export_without_name() {
        let cli =
            Cli::try_parse_from(["lsb", "export", "--scene", "s.json", "--out", "o.json"]).unwrap();
        if let Command::Export(args) = cli.command {
            assert!(args.name.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn export_requires_scene_and_out() {
        assert!(Cli::try_parse_from(["lsb", "export", "--out", "o.json"]).is_err());
        assert!(Cli::try_parse_from(["lsb", "export", "--scene", "s.json"]).is_err());
    }

    #[test]
    fn parse_import() {
        let cli = Cli::try_parse_from(["lsb", "import", "chair.json", "--scene", "s.json"]).unwrap();
        if let Command::Import(args) = cli.command {
            assert_eq!(args.document, PathBuf::from("chair.json"));
            assert_eq!(args.scene, PathBuf::from("s.json"));
            assert!(!args.no_reupload);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_import_no_reupload() {
        let cli = Cli::try_parse_from([
            "lsb", "import", "chair.json", "--scene", "s.json", "--no-reupload",
        ])
        .unwrap();
        if let Command::Import(args) = cli.command {
            assert!(args.no_reupload);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn import_requires_document() {
        assert!(Cli::try_parse_from(["lsb", "import", "--scene", "s.json"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["lsb", "-v", "--config", "lsb.toml", "verify", "a.json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("lsb.toml")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lsb", "inspect", "a.json", "--verbose", "--config", "c.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["lsb", "restore"]).is_err());
        assert!(Cli::try_parse_from(["lsb"]).is_err());
    }
}
