use colored::Colorize;

use crate::config::AdminConfig;
use crate::food::analysis::{LineSource, NutritionReport};
use crate::food::NutritionCalculator;

pub async fn nutrition(config: &AdminConfig, index: usize, apply: bool, offline: bool) -> anyhow::Result<()> {
    let mut store = config.open_store().await?;
    let recipe = store.get(index)?.clone();

    let calculator = if offline {
        NutritionCalculator::offline()
    } else {
        NutritionCalculator::from_config(&config.food)
    };

    println!("\n🥗 Nutrition for {}", recipe.title.bold());
    let report = calculator.compute(&recipe.ingredients, recipe.portion.max(1)).await;
    print_report(&report);

    if apply {
        store.set_nutrition(index, report.per_portion).await?;
        println!("\n✅ {}", "Per-portion values saved".green());
    }
    Ok(())
}

fn print_report(report: &NutritionReport) {
    for line in &report.lines {
        let source = match &line.source {
            Some(LineSource::Api(name)) => name.cyan().to_string(),
            Some(LineSource::Local) => "local table".blue().to_string(),
            Some(LineSource::Estimate) => "estimate".yellow().to_string(),
            None => "skipped".red().to_string(),
        };
        println!(
            "  {} {} {:<24} {:>5} kcal  {}",
            line.amount,
            line.unit,
            line.name,
            line.added.kcal,
            source
        );
        for note in &line.notes {
            println!("      {}", note.dimmed());
        }
    }

    let total = &report.total;
    println!(
        "\n📊 Total: {} kcal | {} g protein | {} g carbs | {} g fat | {} g fiber",
        total.kcal.to_string().cyan(),
        total.protein,
        total.carbs,
        total.fat,
        total.fiber
    );
    if report.portions > 1 {
        let portion = &report.per_portion;
        println!(
            "🍽️  Per portion ({}): {} kcal | {} g protein | {} g carbs | {} g fat | {} g fiber",
            report.portions,
            portion.kcal.to_string().cyan(),
            portion.protein,
            portion.carbs,
            portion.fat,
            portion.fiber
        );
    }
    let estimated = report.estimated_lines();
    if estimated > 0 {
        println!("⚠️  {} ingredient(s) only estimated", estimated.to_string().yellow());
    }
}
