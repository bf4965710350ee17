//! On-disk source trees in a temporary directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use pkgscope::project::{LoadConfig, Preprocessor};
use pkgscope::{BuildContext, Loader, Packages};
use tempfile::TempDir;

/// linux/amd64 without foreign interop, so `_windows.go` and `_plan9.go`
/// files are excluded.
pub fn linux() -> BuildContext {
    BuildContext::new("linux", "amd64").with_foreign_interop(false)
}

/// A source root whose working directory is the root itself.
pub struct Workspace {
    dir: TempDir,
    build: BuildContext,
    preprocessor: Option<Arc<dyn Preprocessor>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            build: linux(),
            preprocessor: None,
        }
    }

    pub fn file(self, rel: &str, src: &str) -> Self {
        self.write(rel, src);
        self
    }

    pub fn write(&self, rel: &str, src: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, src).unwrap();
    }

    pub fn with_build(mut self, build: BuildContext) -> Self {
        self.build = build;
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> LoadConfig {
        let config = LoadConfig::new()
            .with_root(self.root())
            .with_working_dir(self.root())
            .with_build_context(self.build.clone());
        match &self.preprocessor {
            Some(preprocessor) => config.with_preprocessor(preprocessor.clone()),
            None => config,
        }
    }

    pub fn loader(&self) -> Loader {
        Loader::new(self.config())
    }
}

pub fn identities(pkgs: &Packages) -> Vec<&str> {
    pkgs.iter().map(|p| p.identity()).collect()
}

// =============================================================================
// SHARED FIXTURE
// =============================================================================

pub const SHAPES_SRC: &str = r#"package shapes

// Point is a position on the plane.
type Point struct {
	X, Y int
}

func NewPoint(x, y int) Point {
	return Point{X: x, Y: y}
}

func (p Point) Add(q Point) Point {
	return Point{X: p.X + q.X, Y: p.Y + q.Y}
}

func Area(w, h int) int {
	return w * h
}
"#;

pub const GEO_SRC: &str = r#"package geo

import "shapes"

type Path struct {
	Points []shapes.Point
}

func Walk(steps int) shapes.Point {
	at := shapes.NewPoint(0, 0)
	step := shapes.NewPoint(1, 1)
	for i := 0; i < steps; i++ {
		at = at.Add(step)
	}
	return at
}

func Size() int {
	measure := shapes.Area
	return measure(2, 3) + shapes.Area(4, 5)
}
"#;

pub fn shapes_workspace() -> Workspace {
    Workspace::new()
        .file("shapes/shapes.go", SHAPES_SRC)
        .file("geo/geo.go", GEO_SRC)
}

/// `shapes` and `geo` loaded once through one loader, shared by every test
/// that only reads them.
pub struct Shared {
    pub workspace: Workspace,
    pub loader: Loader,
    pub packages: Packages,
}

pub static SHARED: Lazy<Shared> = Lazy::new(|| {
    let workspace = shapes_workspace();
    let loader = workspace.loader();
    let packages = loader.load(&["shapes", "geo"]).unwrap();
    Shared {
        workspace,
        loader,
        packages,
    }
});
