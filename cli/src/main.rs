use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::{env, io};

use anyhow::{Context as _, Result};
use mkninja::Mkninja;
use mkninja::escape::shell_quote;
use mkninja::project::{Helpers, Regenerate, RenderOptions};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod runtime;

const RERUN_SCRIPT: &str = ".rerun_mkninja.sh";
const NINJA_FILE: &str = "build.ninja";

fn utf8(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

/// Resolves a helper executable: an explicit override, else a sibling of
/// the running binary, else a `PATH` lookup, else the bare name.
fn locate_helper(name: &str, exe_dir: Option<&Path>, overridden: Option<&PathBuf>) -> Result<String> {
    if let Some(path) = overridden {
        return Ok(utf8(path)?.to_owned());
    }
    if let Some(dir) = exe_dir {
        let sibling = dir.join(format!("{name}{}", env::consts::EXE_SUFFIX));
        if sibling.is_file() {
            return Ok(utf8(&sibling)?.to_owned());
        }
    }
    match which::which(name) {
        Ok(path) => Ok(utf8(&path)?.to_owned()),
        Err(err) => {
            warn!(helper = name, %err, "helper not found; generated commands will look it up at build time");
            Ok(name.to_owned())
        }
    }
}

/// Replaces `dir/name` with `contents` in one step.
fn write_atomically(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {name}"))?;
    file.persist(dir.join(name))
        .with_context(|| format!("failed to replace {name}"))?;
    debug!(file = name, "wrote");
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let build_dir = env::current_dir().context("cannot determine the build directory")?;
    let source_dir = std::path::absolute(&args.source_dir)
        .with_context(|| format!("invalid source directory {}", args.source_dir.display()))?;
    let exe = env::current_exe().context("cannot locate the running executable")?;

    let exe_dir = exe.parent();
    let helpers = Helpers {
        manifest: locate_helper("manifest", exe_dir, args.manifest.as_ref())?,
        findglob: locate_helper("findglob", exe_dir, args.findglob.as_ref())?,
        stamp: locate_helper("stamp", exe_dir, args.stamp.as_ref())?,
    };

    let project = Mkninja::new(runtime::Host)
        .helpers(helpers)
        .configure(utf8(&source_dir)?, utf8(&build_dir)?)?;

    let rerun_script = build_dir.join(RERUN_SCRIPT);
    let options = RenderOptions {
        is_root: true,
        regenerate: Some(Regenerate {
            rerun_script: utf8(&rerun_script)?.to_owned(),
            generator: utf8(&exe)?.to_owned(),
        }),
    };
    let ninja = project.render(&options);

    // nothing is written unless configuration succeeded
    let mut argv = vec![shell_quote(utf8(&exe)?)];
    argv.extend(env::args_os().skip(1).map(|arg| shell_quote(&arg.to_string_lossy())));
    write_atomically(&build_dir, RERUN_SCRIPT, &format!("#!/bin/sh\n{}\n", argv.join(" ")))?;
    write_atomically(&build_dir, NINJA_FILE, &ninja)?;

    Ok(())
}
