use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_embed::Embed;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::content::question::{ContentError, Question};

#[derive(Embed)]
#[folder = "assets/eras/"]
struct EraAssets;

#[derive(Clone, Debug)]
pub struct Era {
    pub name: String,
    pub order: u32,
    pub questions: Vec<Question>,
}

#[derive(Deserialize)]
struct EraFile {
    name: String,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    questions: Vec<Question>,
}

/// Parse one era file. Invalid questions and repeated IDs are dropped with a
/// warning; only an unparseable file is an error.
pub fn parse_era(file: &str, json: &str) -> Result<Era, ContentError> {
    let raw: EraFile = serde_json::from_str(json).map_err(|source| ContentError::Parse {
        file: file.to_string(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(raw.questions.len());
    for mut q in raw.questions {
        if q.era.is_empty() {
            q.era = raw.name.clone();
        }
        if let Err(e) = q.validate() {
            warn!(file, error = %e, "skipping invalid question");
            continue;
        }
        if !seen.insert(q.id.clone()) {
            warn!(file, id = %q.id, "skipping duplicate question id");
            continue;
        }
        questions.push(q);
    }

    Ok(Era {
        name: raw.name,
        order: raw.order,
        questions,
    })
}

/// Every era known to the app, in display order.
#[derive(Clone, Debug, Default)]
pub struct EraCatalog {
    eras: Vec<Era>,
}

impl EraCatalog {
    pub fn new(mut eras: Vec<Era>) -> Self {
        eras.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Self { eras }
    }

    pub fn bundled() -> Self {
        let mut eras = Vec::new();
        for file in EraAssets::iter() {
            let Some(asset) = EraAssets::get(&file) else {
                continue;
            };
            let Ok(json) = std::str::from_utf8(asset.data.as_ref()) else {
                warn!(file = %file, "bundled era file is not valid UTF-8");
                continue;
            };
            match parse_era(&file, json) {
                Ok(era) => eras.push(era),
                Err(e) => warn!(error = %e, "skipping bundled era"),
            }
        }
        Self::new(eras)
    }

    /// Bundled eras overlaid with `*.json` files from `content_dir`. A user
    /// file replaces the bundled era of the same name.
    pub fn load(content_dir: Option<&Path>) -> Self {
        let mut catalog = Self::bundled();
        let Some(dir) = content_dir else {
            return catalog;
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "content directory unreadable");
                return catalog;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let file = path.display().to_string();
            let result = fs::read_to_string(&path)
                .map_err(|source| ContentError::Io {
                    file: file.clone(),
                    source,
                })
                .and_then(|json| parse_era(&file, &json));
            match result {
                Ok(era) => {
                    debug!(file = %file, era = %era.name, count = era.questions.len(), "loaded user era");
                    catalog.insert(era);
                }
                Err(e) => warn!(error = %e, "skipping user era file"),
            }
        }
        catalog
    }

    fn insert(&mut self, era: Era) {
        self.eras.retain(|e| e.name != era.name);
        self.eras.push(era);
        let eras = std::mem::take(&mut self.eras);
        *self = Self::new(eras);
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    pub fn get(&self, name: &str) -> Option<&Era> {
        self.eras.iter().find(|e| e.name == name)
    }

    pub fn questions(&self, name: &str) -> &[Question] {
        self.get(name).map(|e| e.questions.as_slice()).unwrap_or(&[])
    }

    pub fn question_count(&self, name: &str) -> usize {
        self.questions(name).len()
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.question_count(name) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_catalog_has_playable_eras() {
        let catalog = EraCatalog::bundled();
        assert!(!catalog.eras().is_empty());
        assert!(catalog.eras().iter().any(|e| !e.questions.is_empty()));
        for era in catalog.eras() {
            for q in &era.questions {
                assert!(q.validate().is_ok(), "{} invalid", q.id);
                assert_eq!(q.era, era.name);
            }
        }
    }

    #[test]
    fn test_bundled_catalog_sorted_by_order() {
        let catalog = EraCatalog::bundled();
        let orders: Vec<u32> = catalog.eras().iter().map(|e| e.order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn test_empty_era_is_listed_but_unavailable() {
        let era = parse_era("x.json", r#"{"name": "空の時代", "order": 3}"#).unwrap();
        let catalog = EraCatalog::new(vec![era]);
        assert!(catalog.get("空の時代").is_some());
        assert!(!catalog.is_available("空の時代"));
        assert_eq!(catalog.question_count("missing"), 0);
    }

    #[test]
    fn test_parse_drops_invalid_and_duplicate_questions() {
        let json = r#"{
            "name": "E",
            "questions": [
                {"id": "a", "term": "t", "question": "q", "choices": ["x", "y"], "answer": "x", "explanation": ""},
                {"id": "a", "term": "t", "question": "q", "choices": ["x", "y"], "answer": "y", "explanation": ""},
                {"id": "b", "term": "t", "question": "q", "choices": ["x", "y"], "answer": "z", "explanation": ""}
            ]
        }"#;
        let era = parse_era("e.json", json).unwrap();
        assert_eq!(era.questions.len(), 1);
        assert_eq!(era.questions[0].answer, "x");
        assert_eq!(era.questions[0].era, "E");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_era("broken.json", "{not json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_user_dir_overrides_bundled_era() {
        let dir = TempDir::new().unwrap();
        let bundled = EraCatalog::bundled();
        let first = bundled.eras()[0].name.clone();
        let json = format!(
            r#"{{"name": "{first}", "order": 1, "questions": [
                {{"id": "only", "term": "t", "question": "q", "choices": ["a", "b"], "answer": "a", "explanation": "e"}}
            ]}}"#
        );
        fs::write(dir.path().join("override.json"), json).unwrap();
        fs::write(dir.path().join("garbage.json"), "nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = EraCatalog::load(Some(dir.path()));
        assert_eq!(catalog.eras().len(), bundled.eras().len());
        assert_eq!(catalog.question_count(&first), 1);
        assert_eq!(catalog.questions(&first)[0].id, "only");
    }

    #[test]
    fn test_missing_user_dir_falls_back_to_bundled() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let catalog = EraCatalog::load(Some(&missing));
        assert_eq!(catalog.eras().len(), EraCatalog::bundled().eras().len());
    }
}
