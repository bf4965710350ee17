//! Turning a [`RawPackage`] into a [`ResolvedPackage`].
//!
//! Buildable and non-buildable files are checked together so the whole
//! directory stays queryable. Top-level names of non-buildable files that
//! collide with buildable ones are renamed first, so the buildable
//! declaration keeps its name.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::analyzer::{CheckRequest, Diagnostic, ImportResolver, SemanticAnalyzer};
use crate::base::Position;
use crate::error::LoadError;
use crate::project::RawPackage;
use crate::syntax::ast::{Decl, Spec};
use crate::syntax::{PackageSyntax, SourceFile, rename_idents};

use super::lifetime::LifetimeIndex;
use super::package::ResolvedPackage;

/// Check `raw` and build its lifetime index.
///
/// Soft diagnostics and diagnostics located in non-buildable files are
/// dropped; the first remaining one fails the check. The foreign-interop
/// package is always faked, since excluded files may still import it.
pub fn check_package(
    mut raw: RawPackage,
    analyzer: &Arc<dyn SemanticAnalyzer>,
    importer: Arc<dyn ImportResolver>,
) -> Result<ResolvedPackage, LoadError> {
    let renamed = dedupe_declarations(&mut raw);
    if renamed > 0 {
        debug!(identity = %raw.identity, renamed, "renamed colliding declarations");
    }

    let mut first_error: Option<Diagnostic> = None;
    let analysis = {
        let files: Vec<&SourceFile> = raw
            .buildable_files()
            .chain(raw.non_buildable_files())
            .collect();
        let mut sink = |diag: Diagnostic| {
            if diag.soft {
                trace!(identity = %raw.identity, message = %diag.message, "dropping soft diagnostic");
                return;
            }
            let file = raw.fset.file(diag.pos);
            if let Some(file) = &file
                && raw.non_buildable.contains(file.name())
            {
                trace!(
                    identity = %raw.identity,
                    file = %file.name(),
                    message = %diag.message,
                    "dropping diagnostic in excluded file"
                );
                return;
            }
            if first_error.is_none() {
                first_error = Some(diag);
            }
        };
        analyzer.check(
            CheckRequest {
                path: &raw.identity,
                dir: Some(&raw.dir),
                files,
                fset: &raw.fset,
                importer: &*importer,
                fake_foreign_imports: true,
            },
            &mut sink,
        )
    };

    if let Some(diag) = first_error {
        let position = raw
            .fset
            .position(diag.pos)
            .unwrap_or_else(|| Position::in_file(raw.dir.to_string_lossy().as_ref()));
        return Err(LoadError::Analysis {
            identity: raw.identity,
            position,
            message: diag.message,
        });
    }

    let lifetimes = LifetimeIndex::build(&analysis.info);
    debug!(identity = %raw.identity, symbols = lifetimes.len(), "checked package");

    Ok(ResolvedPackage::new(
        raw.identity,
        raw.dir,
        PackageSyntax::new(raw.name, raw.files),
        raw.fset,
        analysis,
        lifetimes,
        importer,
        analyzer.clone(),
    ))
}

// ============================================================================
// COLLISION DEDUPE
// ============================================================================

/// Rename top-level declarations of non-buildable files whose names are
/// already taken, to `<name>_nobuild<k>`. Methods are keyed by their
/// receiver's base type name. Returns the number of declarations renamed.
pub fn dedupe_declarations(raw: &mut RawPackage) -> usize {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for file in raw.buildable_files() {
        for (owner, name) in top_level_names(file) {
            *counts.entry(key(owner.as_deref(), &name)).or_default() += 1;
        }
    }

    let mut renamed = 0;
    let non_buildable = &raw.non_buildable;
    for file in raw
        .files
        .iter_mut()
        .filter(|f| non_buildable.contains(&f.name))
    {
        let mut renames: FxHashMap<SmolStr, SmolStr> = FxHashMap::default();
        for (owner, name) in top_level_names(file) {
            if owner.is_some() {
                continue;
            }
            if let Some(new) = claim(&mut counts, None, &name) {
                renames.insert(name, new);
            }
        }

        for decl in &mut file.decls {
            let Decl::Func(func) = decl else {
                continue;
            };
            let Some(base) = func.receiver_base().map(|b| b.name.clone()) else {
                continue;
            };
            let base = renames.get(&base).cloned().unwrap_or(base);
            if let Some(new) = claim(&mut counts, Some(base.as_str()), &func.name.name) {
                func.name.name = new;
                renamed += 1;
            }
        }

        renamed += renames.len();
        rename_idents(file, &renames);
    }
    renamed
}

fn key(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) => format!("{owner}.{name}"),
        None => name.to_string(),
    }
}

/// Record one more declaration of `name`; when the name was already taken,
/// return the lowest free `<name>_nobuild<k>` and reserve it. Names declared
/// by buildable files count as taken.
fn claim(counts: &mut FxHashMap<String, usize>, owner: Option<&str>, name: &str) -> Option<SmolStr> {
    let is_taken = |counts: &FxHashMap<String, usize>, n: &str| {
        counts.get(&key(owner, n)).is_some_and(|c| *c > 0)
    };
    let fresh = is_taken(counts, name).then(|| {
        let candidate = (1..)
            .map(|k| format!("{name}_nobuild{k}"))
            .find(|candidate| !is_taken(counts, candidate))
            .unwrap_or_default();
        *counts.entry(key(owner, &candidate)).or_default() += 1;
        SmolStr::from(candidate)
    });
    *counts.entry(key(owner, name)).or_default() += 1;
    fresh
}

/// Top-level names declared by `file`, with the receiver base type name
/// for methods. Blank names and `init` functions are skipped.
fn top_level_names(file: &SourceFile) -> Vec<(Option<SmolStr>, SmolStr)> {
    let mut names = Vec::new();
    for decl in &file.decls {
        match decl {
            Decl::Func(func) => match (&func.recv, func.receiver_base()) {
                (Some(_), Some(base)) => names.push((Some(base.name.clone()), func.name.name.clone())),
                (Some(_), None) => {}
                (None, _) if func.name.name == "init" => {}
                (None, _) => names.push((None, func.name.name.clone())),
            },
            Decl::Gen(gen_decl) => {
                for spec in &gen_decl.specs {
                    match spec {
                        Spec::Import(_) => {}
                        Spec::Value(value) => {
                            names.extend(value.names.iter().map(|n| (None, n.name.clone())))
                        }
                        Spec::Type(ty) => names.push((None, ty.name.name.clone())),
                    }
                }
            }
        }
    }
    names.retain(|(_, name)| name != "_");
    names
}
