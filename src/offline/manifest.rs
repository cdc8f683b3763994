//! Deployment manifest: the cache generation and the precache set.
//!
//! Both are compiled in. Bumping [`GENERATION`] is how a new deployment
//! supersedes the assets cached by the previous one.

use url::Url;

/// Name of the active cache generation.
pub const GENERATION: &str = "ll-toolbox-v2";

/// Location of the cache controller relative to the site root.
///
/// Precache entries are resolved against this path, the same way a
/// browser resolves them against the registered script.
pub const SCRIPT_PATH: &str = "assets/sw.js";

/// Core assets, always cached at install time.
pub const PRECACHE: &[&str] = &[
    "./css/style.css",
    "./js/layout.js",
    "./favicon.svg",
    "../../index.html",
    "../../impressum.html",
    "../../privacy.html",
];

/// A generation name plus the absolute URLs it must contain.
#[derive(Debug, Clone)]
pub struct Manifest {
    generation: String,
    scope: Url,
    precache: Vec<Url>,
}

impl Manifest {
    /// Build the compiled-in manifest for a site served at `origin`.
    pub fn for_origin(origin: &Url) -> Result<Self, url::ParseError> {
        let script = origin.join(SCRIPT_PATH)?;
        Self::new(GENERATION, origin.clone(), &script, PRECACHE)
    }

    /// Build a manifest with explicit values, resolving each precache entry
    /// against `script`.
    pub fn new(
        generation: impl Into<String>,
        scope: Url,
        script: &Url,
        precache: &[&str],
    ) -> Result<Self, url::ParseError> {
        let precache = precache
            .iter()
            .map(|path| script.join(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            generation: generation.into(),
            scope,
            precache,
        })
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Scope URL; its origin decides same-origin classification.
    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn precache(&self) -> &[Url] {
        &self.precache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precache_resolves_against_script() {
        let origin = Url::parse("https://tools.example/").unwrap();
        let manifest = Manifest::for_origin(&origin).unwrap();

        let paths: Vec<&str> = manifest.precache().iter().map(Url::path).collect();
        assert_eq!(
            paths,
            [
                "/assets/css/style.css",
                "/assets/js/layout.js",
                "/assets/favicon.svg",
                "/index.html",
                "/impressum.html",
                "/privacy.html",
            ]
        );
        assert_eq!(manifest.generation(), GENERATION);
    }

    #[test]
    fn test_subdirectory_origin() {
        let origin = Url::parse("https://host.example/toolbox/").unwrap();
        let manifest = Manifest::for_origin(&origin).unwrap();
        assert_eq!(
            manifest.precache()[0].as_str(),
            "https://host.example/toolbox/assets/css/style.css"
        );
        // two levels up from `toolbox/assets/` leaves the subdirectory
        assert_eq!(
            manifest.precache()[3].as_str(),
            "https://host.example/index.html"
        );
    }
}
