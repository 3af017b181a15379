use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::{Language, TranslateError, Translator};

type Tree = Map<String, Value>;

/// Keys of `source` that need (re)translation: absent from `translated`, or
/// strings whose German text differs from the snapshot taken at the last run.
/// Without a snapshot, changed strings cannot be detected and only missing
/// keys are reported.
pub fn find_missing_keys(source: &Tree, translated: &Tree, previous_source: Option<&Tree>) -> Tree {
    let mut missing = Map::new();
    let empty = Map::new();

    for (key, value) in source {
        let previous = previous_source.map(|p| p.get(key));
        match (value, translated.get(key)) {
            (_, None) => {
                missing.insert(key.clone(), value.clone());
            }
            (Value::Object(nested), Some(Value::Object(nested_translated))) => {
                let nested_previous = match previous {
                    Some(Some(Value::Object(p))) => Some(p),
                    Some(_) => Some(&empty),
                    None => None,
                };
                let nested_missing = find_missing_keys(nested, nested_translated, nested_previous);
                if !nested_missing.is_empty() {
                    missing.insert(key.clone(), Value::Object(nested_missing));
                }
            }
            (Value::Object(_), Some(_)) => {
                missing.insert(key.clone(), value.clone());
            }
            (Value::String(_), Some(_)) => {
                if let Some(previous) = previous {
                    if previous != Some(value) {
                        missing.insert(key.clone(), value.clone());
                    }
                }
            }
            _ => {}
        }
    }

    missing
}

/// Overlays `new` onto `base`, merging nested objects key by key.
pub fn merge(base: &Tree, new: &Tree) -> Tree {
    let mut result = base.clone();
    for (key, value) in new {
        let merged = match (result.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => Value::Object(merge(existing, incoming)),
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Non-blank string leaves.
pub fn count_strings(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_strings).sum(),
        Value::String(s) if !s.trim().is_empty() => 1,
        _ => 0,
    }
}

/// Sets `"a.b.c"` in the tree, creating (or replacing) intermediate objects.
pub fn set_nested_key(tree: &mut Tree, key_path: &str, value: Value) {
    let keys: Vec<&str> = key_path.split('.').collect();
    let (last, parents) = match keys.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = tree;
    for key in parents {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

fn string_leaves(value: &Value, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                path.push(key.clone());
                string_leaves(nested, path, out);
                path.pop();
            }
        }
        Value::String(s) if !s.trim().is_empty() => out.push((path.clone(), s.clone())),
        _ => {}
    }
}

fn leaf_mut<'v>(value: &'v mut Value, path: &[String]) -> Option<&'v mut Value> {
    path.iter().try_fold(value, |current, key| current.get_mut(key.as_str()))
}

/// Translates every non-blank string leaf, keeping the structure.
pub async fn translate_tree(
    tree: &Tree,
    translator: &dyn Translator,
    lang: &Language,
    progress: &ProgressBar,
) -> Result<Tree, TranslateError> {
    let mut root = Value::Object(tree.clone());
    let mut leaves = Vec::new();
    string_leaves(&root, &mut Vec::new(), &mut leaves);

    for (path, text) in leaves {
        progress.set_message(path.join("."));
        let translated = translator.translate(&text, lang).await?;
        if let Some(slot) = leaf_mut(&mut root, &path) {
            *slot = Value::String(translated);
        }
        progress.inc(1);
    }

    match root {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UiOutcome {
    pub language: String,
    pub reused: usize,
    pub translated: usize,
    pub total: usize,
    pub written: bool,
}

/// Per-language UI string files next to `ui-translations.json`.
pub struct UiTranslator<'a> {
    translator: &'a dyn Translator,
    lib_dir: PathBuf,
    show_progress: bool,
}

impl<'a> UiTranslator<'a> {
    pub fn new(translator: &'a dyn Translator, lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            translator,
            lib_dir: lib_dir.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn source_path(&self) -> PathBuf {
        source_file(&self.lib_dir)
    }

    pub fn language_path(&self, lang: &Language) -> PathBuf {
        language_file(&self.lib_dir, lang)
    }

    pub fn snapshot_path(&self, lang: &Language) -> PathBuf {
        snapshot_file(&self.lib_dir, lang)
    }

    pub async fn load_source(&self) -> Result<Tree, TranslateError> {
        load_source(&self.lib_dir).await
    }

    pub async fn translate_language(
        &self,
        source: &Tree,
        lang: &Language,
        full: bool,
    ) -> Result<UiOutcome, TranslateError> {
        let existing = if full {
            Map::new()
        } else {
            load_tree(&self.language_path(lang))
                .await
                .and_then(|data| data.get(lang.code()).and_then(|v| v.as_object()).cloned())
                .unwrap_or_default()
        };
        let snapshot = if full {
            None
        } else {
            load_tree(&self.snapshot_path(lang)).await
        };

        let missing = if full {
            source.clone()
        } else {
            find_missing_keys(source, &existing, snapshot.as_ref())
        };

        let total = count_strings(&Value::Object(source.clone()));
        let reused = count_strings(&Value::Object(existing.clone()));
        let to_translate = count_strings(&Value::Object(missing.clone()));

        if missing.is_empty() {
            info!("{}: all UI strings already translated", lang);
            if snapshot.is_none() {
                write_tree(&self.snapshot_path(lang), source).await?;
            }
            return Ok(UiOutcome {
                language: lang.code().to_string(),
                reused,
                translated: 0,
                total,
                written: false,
            });
        }

        let progress = self.progress_bar(to_translate);
        let newly_translated = translate_tree(&missing, self.translator, lang, &progress).await?;
        progress.finish_and_clear();

        let complete = merge(&existing, &newly_translated);
        let mut output = Map::new();
        output.insert(lang.code().to_string(), Value::Object(complete));
        write_tree(&self.language_path(lang), &output).await?;
        write_tree(&self.snapshot_path(lang), source).await?;

        info!(
            "{}: {} UI strings reused, {} translated",
            lang, reused, to_translate
        );
        Ok(UiOutcome {
            language: lang.code().to_string(),
            reused,
            translated: to_translate,
            total,
            written: true,
        })
    }

    /// Translates single German strings and stores them under dotted keys,
    /// leaving the rest of the language file untouched.
    pub async fn set_keys(&self, entries: &[(String, String)], lang: &Language) -> Result<usize, TranslateError> {
        let path = self.language_path(lang);
        let mut data = load_tree(&path).await.unwrap_or_default();
        let mut strings = match data.remove(lang.code()) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        for (key, german) in entries {
            let translated = self.translator.translate(german, lang).await?;
            set_nested_key(&mut strings, key, Value::String(translated));
        }

        data.insert(lang.code().to_string(), Value::Object(strings));
        write_tree(&path, &data).await?;
        Ok(entries.len())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░ "),
        );
        bar
    }
}

fn source_file(lib_dir: &Path) -> PathBuf {
    lib_dir.join("ui-translations.json")
}

fn language_file(lib_dir: &Path, lang: &Language) -> PathBuf {
    lib_dir.join(format!("ui-translations-{}.json", lang.code()))
}

fn snapshot_file(lib_dir: &Path, lang: &Language) -> PathBuf {
    lib_dir.join(format!("ui-translations-{}.source.json", lang.code()))
}

/// The German strings under the `de` key of `ui-translations.json`.
pub async fn load_source(lib_dir: &Path) -> Result<Tree, TranslateError> {
    let path = source_file(lib_dir);
    let content = tokio::fs::read_to_string(&path).await?;
    let data: Value = serde_json::from_str(&content)?;
    match data.get("de") {
        Some(Value::Object(de)) if !de.is_empty() => Ok(de.clone()),
        _ => Err(TranslateError::Format(format!(
            "{} has no German strings under \"de\"",
            path.display()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UiFileStatus {
    Complete { strings: usize },
    Missing,
    Unreadable { reason: String },
    /// Source keys without a translation.
    Incomplete { missing: usize },
    /// German strings edited since the file was last translated.
    Outdated { changed: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct UiFileReport {
    pub language: String,
    pub path: PathBuf,
    pub status: UiFileStatus,
}

impl UiFileReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, UiFileStatus::Complete { .. })
    }
}

/// Checks that every language file exists and is in sync with the German
/// source, without calling DeepL.
pub async fn verify_language_files(lib_dir: &Path, source: &Tree, languages: &[Language]) -> Vec<UiFileReport> {
    let mut reports = Vec::with_capacity(languages.len());
    for lang in languages {
        let path = language_file(lib_dir, lang);
        let status = language_file_status(&path, snapshot_file(lib_dir, lang), source, lang).await;
        reports.push(UiFileReport {
            language: lang.code().to_string(),
            path,
            status,
        });
    }
    reports
}

async fn language_file_status(path: &Path, snapshot: PathBuf, source: &Tree, lang: &Language) -> UiFileStatus {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return UiFileStatus::Missing,
        Err(e) => return UiFileStatus::Unreadable { reason: e.to_string() },
    };
    let data: Value = match serde_json::from_str(&content) {
        Ok(data) => data,
        Err(e) => return UiFileStatus::Unreadable { reason: e.to_string() },
    };
    let strings = match data.get(lang.code()) {
        Some(Value::Object(strings)) => strings,
        _ => {
            return UiFileStatus::Unreadable {
                reason: format!("no \"{}\" object", lang.code()),
            }
        }
    };

    let missing = count_strings(&Value::Object(find_missing_keys(source, strings, None)));
    if missing > 0 {
        return UiFileStatus::Incomplete { missing };
    }
    if let Some(previous) = load_tree(&snapshot).await {
        let changed = count_strings(&Value::Object(find_missing_keys(source, strings, Some(&previous))));
        if changed > 0 {
            return UiFileStatus::Outdated { changed };
        }
    }
    UiFileStatus::Complete {
        strings: count_strings(&Value::Object(source.clone())),
    }
}

async fn load_tree(path: &Path) -> Option<Tree> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

async fn write_tree(path: &Path, tree: &Tree) -> Result<(), TranslateError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_string_pretty(tree)?).await?;
    Ok(())
}
