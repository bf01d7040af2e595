use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};

use pdxsync::config::{Config, DEFAULT_CONFIG_FILE};
use pdxsync::logging::*;
use pdxsync::manifest::ManifestSlot;
use pdxsync::reference::generate_reference_data;
use pdxsync::session::{scan_local, RemoteSlot, SyncSession};
use pdxsync::util;

///////////////////////
// Utility functions //
///////////////////////

/// Config file, then `PDX_*` environment, then command-line flags
fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
	let mut config = match matches.get_one::<String>("config") {
		Some(path) => Config::load(Path::new(path))?,
		None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
			Config::load(Path::new(DEFAULT_CONFIG_FILE))?
		}
		None => Config::default(),
	};
	config.apply_env()?;

	if let Some(owner) = matches.get_one::<String>("owner") {
		config.owner = Some(owner.clone());
	}
	if let Some(level) = matches.get_one::<String>("log-level") {
		config.log_level = level.clone();
	}
	Ok(config)
}

fn remote_slot(matches: &ArgMatches) -> RemoteSlot {
	if matches.get_flag("previous") {
		RemoteSlot::Previous
	} else {
		RemoteSlot::Current
	}
}

async fn write_document(path: &Path, document: &[u8]) -> Result<(), Box<dyn Error>> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		util::mkdir_p(parent).await?;
	}
	tokio::fs::write(path, document).await?;
	eprintln!("Manifest written to {}", path.display());
	Ok(())
}

fn slot_args(cmd: Command) -> Command {
	cmd.arg(
		Arg::new("previous")
			.long("previous")
			.action(ArgAction::SetTrue)
			.help("Compare against the previously pulled remote manifest"),
	)
	.arg(
		Arg::new("rescan")
			.long("rescan")
			.action(ArgAction::SetTrue)
			.help("Rebuild the local manifest instead of loading the stored one"),
	)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = Command::new("pdxsync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Manifest-based change detection between a remote tree and a local mirror")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("Config file (TOML, or JSON5 by extension)"),
		)
		.arg(
			Arg::new("owner")
				.long("owner")
				.value_name("NAME")
				.global(true)
				.help("Attribution recorded in locally built manifests"),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.value_name("LEVEL")
				.global(true)
				.help("Log level when RUST_LOG is unset"),
		)
		.subcommand(slot_args(
			Command::new("pull").about("Download the remote manifest and compare it with local"),
		))
		.subcommand(slot_args(
			Command::new("status").about("Compare stored manifests without contacting the remote"),
		))
		.subcommand(
			Command::new("manifest")
				.about("Build the manifest of a local directory")
				.arg(Arg::new("dir").required(true))
				.arg(
					Arg::new("output")
						.short('o')
						.long("output")
						.value_name("FILE")
						.help("Output file (default: local manifest slot)"),
				),
		)
		.subcommand(
			Command::new("scan-remote")
				.about("Build the manifest of the remote tree through the transport")
				.arg(
					Arg::new("output")
						.short('o')
						.long("output")
						.value_name("FILE")
						.help("Output file (default: stdout)"),
				),
		)
		.subcommand(
			Command::new("reference")
				.about("Generate reference data")
				.arg(Arg::new("dir").required(true))
				.arg(
					Arg::new("version")
						.long("version-tag")
						.value_name("TAG")
						.default_value("01")
						.help("Version written into every reference file"),
				)
				.arg(
					Arg::new("clean")
						.long("clean")
						.action(ArgAction::SetTrue)
						.help("Remove the directory before writing"),
				),
		)
		.get_matches();

	let config = load_config(&matches)?;
	init_tracing(&config.log_level);

	if let Some(sub_matches) =
		matches.subcommand_matches("pull").or_else(|| matches.subcommand_matches("status"))
	{
		let pull = matches.subcommand_name() == Some("pull");
		let mut session = SyncSession::new(config)?.rescan_local(sub_matches.get_flag("rescan"));
		let slot = remote_slot(sub_matches);
		let report = if pull { session.pull(slot).await } else { session.status(slot).await };
		match report {
			Ok(report) => print!("{}", report),
			Err(e) => {
				error!("{}", e);
				return Err(e.into());
			}
		}
	} else if let Some(sub_matches) = matches.subcommand_matches("manifest") {
		let dir = sub_matches.get_one::<String>("dir").ok_or("manifest: directory argument required")?;
		let manifest = scan_local(Path::new(dir), config.normalize_policy, config.owner.clone()).await?;
		let output = match sub_matches.get_one::<String>("output") {
			Some(out) => PathBuf::from(out),
			None => config.local_aux_dir.join(ManifestSlot::Local.file_name()),
		};
		write_document(&output, &manifest.to_document()?).await?;
	} else if let Some(sub_matches) = matches.subcommand_matches("scan-remote") {
		let mut session = SyncSession::new(config)?;
		let manifest = session.scan_remote().await?;
		let document = manifest.to_document()?;
		match sub_matches.get_one::<String>("output") {
			Some(out) => write_document(Path::new(out), &document).await?,
			None => println!("{}", String::from_utf8_lossy(&document)),
		}
	} else if let Some(sub_matches) = matches.subcommand_matches("reference") {
		let dir = sub_matches.get_one::<String>("dir").ok_or("reference: directory argument required")?;
		let version = sub_matches.get_one::<String>("version").map(|s| s.as_str()).unwrap_or("01");
		if sub_matches.get_flag("clean") {
			util::remove_tree_tolerant(Path::new(dir)).await?;
		}
		generate_reference_data(Path::new(dir), version).await?;
	}

	Ok(())
}

// vim: ts=4
