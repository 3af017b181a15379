use anyhow::bail;
use colored::Colorize;

use super::confirm;
use crate::config::AdminConfig;
use crate::recipe::store::load_recipes;
use crate::translate::recipes::{load_translations, save_translations, translations_path};
use crate::translate::ui::load_source;
use crate::translate::{
    verify_language_files, DeepLClient, Language, QuotaLevel, RecipeTranslator, UiFileStatus, UiTranslator,
    Usage,
};

fn languages(config: &AdminConfig, lang: Option<&str>) -> Vec<Language> {
    match lang {
        Some(code) => Language::parse_list(code),
        None => config.target_languages.clone(),
    }
}

fn print_usage(usage: &Usage) {
    let percent = format!("{:.1}%", usage.percent);
    let percent = match usage.level {
        QuotaLevel::Ok => percent.green(),
        QuotaLevel::Half => percent.cyan(),
        QuotaLevel::Warning => percent.yellow(),
        QuotaLevel::Critical => percent.red().bold(),
    };
    println!(
        "📊 DeepL: {} of {} characters used ({}), {} available",
        usage.used, usage.limit, percent, usage.available
    );
}

pub async fn quota(config: &AdminConfig) -> anyhow::Result<()> {
    let client = DeepLClient::new(config.deepl_config()?);
    println!(
        "🔑 {} API",
        if client.config().is_free() { "Free" } else { "Pro" }
    );
    print_usage(&client.usage().await?);
    Ok(())
}

pub async fn translate_recipes(config: &AdminConfig, yes: bool, lang: Option<&str>) -> anyhow::Result<()> {
    let client = DeepLClient::new(config.deepl_config()?);

    let usage = client.usage().await?;
    print_usage(&usage);
    if usage.level == QuotaLevel::Critical && !yes && !confirm("Quota almost used up. Continue?")? {
        println!("Aborted.");
        return Ok(());
    }

    let source = load_recipes(&config.recipes_path()).await?;
    if source.is_empty() {
        bail!("{} contains no recipes", config.recipes_path().display());
    }

    let translator = RecipeTranslator::new(&client).with_progress(true);
    for lang in languages(config, lang) {
        println!("\n🌍 {} ({} recipes)", lang.code().to_uppercase().bold(), source.len());
        let path = translations_path(&config.admin_dir, &lang);
        let existing = load_translations(&path).await;

        let outcome = translator.translate_all(&source, existing, &lang).await?;
        save_translations(&path, &outcome.recipes).await?;
        println!(
            "  ✅ {} translated, {} reused → {}",
            outcome.translated.to_string().cyan(),
            outcome.reused.to_string().green(),
            path.display()
        );
    }

    if let Ok(usage) = client.usage().await {
        println!();
        print_usage(&usage);
    }
    Ok(())
}

pub async fn translate_ui(
    config: &AdminConfig,
    full: bool,
    lang: Option<&str>,
    set: &[(String, String)],
) -> anyhow::Result<()> {
    let client = DeepLClient::new(config.deepl_config()?);
    let ui = UiTranslator::new(&client, config.ui_lib_dir()).with_progress(true);

    if !set.is_empty() {
        for lang in languages(config, lang) {
            let count = ui.set_keys(set, &lang).await?;
            println!("✏️  {}: {} string(s) set", lang.code().to_uppercase().bold(), count);
        }
        return Ok(());
    }

    let source = ui.load_source().await?;
    for lang in languages(config, lang) {
        let outcome = ui.translate_language(&source, &lang, full).await?;
        if outcome.written {
            println!(
                "🌍 {}: {} translated, {} reused of {}",
                lang.code().to_uppercase().bold(),
                outcome.translated.to_string().cyan(),
                outcome.reused,
                outcome.total
            );
        } else {
            println!("✅ {}: up to date", lang.code().to_uppercase().bold());
        }
    }
    Ok(())
}

/// Reports per language whether its UI file exists and matches the German
/// source. Fails when any file needs work.
pub async fn verify_ui(config: &AdminConfig, lang: Option<&str>) -> anyhow::Result<()> {
    let lib_dir = config.ui_lib_dir();
    let source = load_source(&lib_dir).await?;
    let reports = verify_language_files(&lib_dir, &source, &languages(config, lang)).await;

    println!("\n🔍 UI translations in {}", lib_dir.display());
    for report in &reports {
        let code = report.language.to_uppercase().bold();
        match &report.status {
            UiFileStatus::Complete { strings } => println!("  ✅ {}: {} strings", code, strings),
            UiFileStatus::Missing => println!("  ❌ {}: {} is missing", code, report.path.display()),
            UiFileStatus::Unreadable { reason } => println!("  ❌ {}: unreadable ({})", code, reason),
            UiFileStatus::Incomplete { missing } => {
                println!("  ⚠️  {}: {} strings not translated", code, missing.to_string().yellow())
            }
            UiFileStatus::Outdated { changed } => {
                println!("  ⚠️  {}: {} German strings changed since", code, changed.to_string().yellow())
            }
        }
    }

    let failing = reports.iter().filter(|r| !r.is_ok()).count();
    if failing > 0 {
        bail!("{} of {} language files need `translate-ui`", failing, reports.len());
    }
    println!("\n✅ {}", "All language files are complete".green());
    Ok(())
}
