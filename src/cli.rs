//! Command implementations behind the `pyrmute` binary.
//!
//! Each command returns a response value; the binary serializes it. Input
//! trees are JSON files produced by the external parser.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use pyrmute_core::render::to_source;
use pyrmute_core::{Config, Module};
use pyrmute_rewrite::rewrite_module;
use pyrmute_runtime::Interpreter;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::PyrmuteError;
use crate::output::{ContentHash, ExecResponse, FileResult, RewriteResponse};

/// What each rewritten file contributes to the response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The rewritten tree as JSON.
    #[default]
    Json,
    /// The rendered rewritten source.
    Source,
}

// ============================================================================
// Inputs
// ============================================================================

/// Expand the given paths into input files: files are taken as given,
/// directories are walked for `*.json`. Results are sorted per directory.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, PyrmuteError> {
    if paths.is_empty() {
        return Err(PyrmuteError::invalid_args("no input paths given"));
    }
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_file() {
            inputs.push(path.clone());
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            found.sort();
            debug!(dir = %path.display(), files = found.len(), "walked input directory");
            inputs.extend(found);
        } else {
            return Err(PyrmuteError::file_not_found(path));
        }
    }
    Ok(inputs)
}

/// Read and parse one input tree.
pub fn load_tree(path: &Path) -> Result<(Module, ContentHash), PyrmuteError> {
    if !path.exists() {
        return Err(PyrmuteError::file_not_found(path));
    }
    let text = fs::read_to_string(path).map_err(|e| PyrmuteError::io(path, e))?;
    let module = Module::from_json(&text).map_err(|e| PyrmuteError::from_core(path, e))?;
    Ok((module, ContentHash::compute(text.as_bytes())))
}

/// `<stem>-dump.py` beside the input.
pub fn dump_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unit".to_string());
    input.with_file_name(format!("{}-dump.py", stem))
}

// ============================================================================
// Commands
// ============================================================================

/// Rewrite every input. The first failure aborts the whole command.
pub fn run_rewrite(
    paths: &[PathBuf],
    config: &Config,
    format: OutputFormat,
    dump: bool,
) -> Result<RewriteResponse, PyrmuteError> {
    let inputs = collect_inputs(paths)?;
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (module, input_hash) = load_tree(&input)?;
        let output = rewrite_module(&module, config).map_err(|e| PyrmuteError::rewrite(&input, e))?;
        info!(path = %input.display(), imports = output.imports, "rewrote");

        let rendered = (format == OutputFormat::Source || dump).then(|| to_source(&output.module));
        let dump = match (&rendered, dump) {
            (Some(source), true) => {
                let target = dump_path(&input);
                fs::write(&target, source).map_err(|e| PyrmuteError::io(&target, e))?;
                debug!(path = %target.display(), "wrote dump");
                Some(target.display().to_string())
            }
            _ => None,
        };
        let (tree, source) = match format {
            OutputFormat::Json => (Some(output.module), None),
            OutputFormat::Source => (None, rendered),
        };
        files.push(FileResult {
            path: input.display().to_string(),
            input_hash,
            imports: output.imports,
            tree,
            source,
            dump,
        });
    }
    Ok(RewriteResponse::new(files))
}

/// Render an input tree as source.
pub fn run_render(path: &Path) -> Result<String, PyrmuteError> {
    let (module, _) = load_tree(path)?;
    Ok(to_source(&module))
}

/// Execute an input tree with the evaluator, rewriting it first unless
/// `rewrite` is false.
pub fn run_exec(path: &Path, config: &Config, rewrite: bool) -> Result<ExecResponse, PyrmuteError> {
    let (module, _) = load_tree(path)?;
    let module = if rewrite {
        rewrite_module(&module, config)
            .map_err(|e| PyrmuteError::rewrite(path, e))?
            .module
    } else {
        module
    };

    let mut interp = Interpreter::new(config);
    interp
        .run(&module)
        .map_err(|e| PyrmuteError::execution(path, e))?;
    info!(path = %path.display(), rewritten = rewrite, "executed");

    let bindings = interp
        .bindings()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let traced = interp.traced().iter().map(ToString::to_string).collect();
    Ok(ExecResponse::new(
        path.display().to_string(),
        rewrite,
        bindings,
        traced,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrmute_core::{build, Location};
    use tempfile::TempDir;

    fn write_unit(dir: &Path, name: &str, module: &Module) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, module.to_json().unwrap()).unwrap();
        path
    }

    fn mapping_unit() -> Module {
        let loc = Location::new(1, 0);
        Module::new(vec![
            build::assign(
                vec![build::name("m", loc)],
                build::dict(vec![(Some(build::string("a", loc)), build::int(1, loc))], loc),
                loc,
            ),
            build::assign(
                vec![build::name("m", loc).index(build::string("b", loc))],
                build::int(2, loc),
                loc,
            ),
        ])
    }

    #[test]
    fn directories_are_walked_for_json() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_unit(dir.path(), "b.json", &mapping_unit());
        write_unit(&dir.path().join("nested"), "a.json", &mapping_unit());
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|p| p.extension().unwrap() == "json"));
    }

    #[test]
    fn missing_input_is_reported() {
        let err = collect_inputs(&[PathBuf::from("/nonexistent/unit.json")]).unwrap_err();
        assert!(matches!(err, PyrmuteError::FileNotFound { .. }));
    }

    #[test]
    fn rewrite_as_source_with_dump() {
        let dir = TempDir::new().unwrap();
        let input = write_unit(dir.path(), "unit.json", &mapping_unit());

        let response =
            run_rewrite(&[input.clone()], &Config::default(), OutputFormat::Source, true).unwrap();
        let file = &response.files[0];
        assert_eq!(file.imports, 2);
        assert!(file.tree.is_none());
        let source = file.source.as_deref().unwrap();
        assert!(source.contains("m = _set_subscript_with_fallback(m, 'b', 2)\n"));

        let dumped = fs::read_to_string(dir.path().join("unit-dump.py")).unwrap();
        assert_eq!(dumped, source);
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.json");
        fs::write(&input, "{\"body\": 3}").unwrap();
        let err = run_render(&input).unwrap_err();
        assert!(matches!(err, PyrmuteError::InvalidTree { .. }));
    }

    #[test]
    fn exec_reports_persistent_bindings() {
        let dir = TempDir::new().unwrap();
        let input = write_unit(dir.path(), "unit.json", &mapping_unit());

        let response = run_exec(&input, &Config::default(), true).unwrap();
        assert_eq!(response.bindings["m"], "pmap({'a': 1, 'b': 2})");

        let plain = run_exec(&input, &Config::default(), false).unwrap();
        assert_eq!(plain.bindings["m"], "{'a': 1, 'b': 2}");
    }
}
