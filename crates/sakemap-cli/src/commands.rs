//! Subcommand handlers.
//!
//! Each subcommand is a separate function; output goes to stdout, warnings
//! to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use sakemap_core::questionnaire::{is_visible, unanswered};
use sakemap_core::store::sanitize;
use sakemap_core::{
    is_complete, visible_questions, write_cluster_csv, AnswerSet, DirectorySource, Engine,
    FilePreferenceStore, FlavorAxis, Outcome, PreferenceStore, Question, SakemapConfig,
    TasteVector,
};
use serde_json::json;

use crate::OutputFormat;

fn engine(config: &SakemapConfig) -> Engine<DirectorySource> {
    Engine::new(
        DirectorySource::new(&config.catalog.data_dir),
        config.clone(),
    )
}

fn preference_store(config: &SakemapConfig) -> Result<FilePreferenceStore> {
    let dir = config.storage.preference_dir.as_ref().ok_or_else(|| {
        anyhow!("no preference directory configured (set storage.preference_dir or pass --preference-dir)")
    })?;
    Ok(FilePreferenceStore::new(dir))
}

fn parse_answers(pairs: &[String], file: Option<&Path>) -> Result<AnswerSet> {
    let mut answers = match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading answers from {}", path.display()))?;
            serde_json::from_str::<AnswerSet>(&text)
                .with_context(|| format!("parsing answers in {}", path.display()))?
        }
        None => AnswerSet::new(),
    };
    for pair in pairs {
        let (question, value) = AnswerSet::parse_pair(pair)
            .ok_or_else(|| anyhow!("invalid answer '{pair}', expected QUESTION=VALUE"))?;
        answers.insert(question, value);
    }
    Ok(answers)
}

/// Warns about answers the questionnaire would not accept.
fn warn_unusual_answers(answers: &AnswerSet) {
    for (id, value) in answers.iter() {
        match Question::from_id(id) {
            Some(question) => {
                if question.delta(value).is_none() {
                    eprintln!(
                        "{} '{value}' is not an option of '{id}'; it is ignored",
                        "warning:".yellow().bold()
                    );
                } else if !is_visible(question, answers) {
                    eprintln!(
                        "{} '{id}' is not shown for this pairing but still counts",
                        "note:".cyan()
                    );
                }
            }
            None => tracing::debug!(question = id, "answer outside the questionnaire"),
        }
    }
}

fn format_vector(v: &TasteVector) -> String {
    v.iter()
        .map(|x| format!("{x:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn recommend(
    config: &SakemapConfig,
    pairs: &[String],
    answers_file: Option<&Path>,
    no_save: bool,
    format: OutputFormat,
) -> Result<()> {
    let answers = parse_answers(pairs, answers_file)?;
    warn_unusual_answers(&answers);

    let mut engine = engine(config);
    if !no_save {
        if let Ok(store) = preference_store(config) {
            engine = engine.with_store(Arc::new(store));
        }
    }

    let answer = engine.answer(&answers).context("recommending")?;

    if format == OutputFormat::Json {
        return print_json(&answer);
    }

    let snapshot = engine.catalog(false)?;
    match &answer.outcome {
        Outcome::Clustered { cluster, .. } => {
            println!("{} {}", "Cluster:".bold(), cluster.to_string().green());
        }
        Outcome::Fallback { .. } => {
            println!("{}", "No cluster model; ranked by flavor tags".yellow());
        }
    }
    println!("{} [{}]", "Preference:".bold(), format_vector(&answer.preference));

    let mut table = new_table(vec!["#", "ID", "Name", "Brewery"]);
    for (rank, brand) in answer.outcome.brands().into_iter().enumerate() {
        let brewery = brand
            .brewery_id
            .as_deref()
            .and_then(|id| snapshot.brewery_name(id))
            .unwrap_or("-");
        table.add_row(vec![
            (rank + 1).to_string(),
            brand.id.clone(),
            brand.name.clone(),
            brewery.to_string(),
        ]);
    }
    if answer.outcome.is_empty() {
        println!("No brands to recommend.\n");
    } else {
        println!("{table}");
    }
    Ok(())
}

pub fn clusters(config: &SakemapConfig, format: OutputFormat) -> Result<()> {
    let engine = engine(config);
    let Some(model) = engine.model()? else {
        bail!("the flavor charts contain no usable records");
    };

    let sizes = model.cluster_sizes();
    if format == OutputFormat::Json {
        return print_json(&json!({
            "k": model.k(),
            "iterations": model.iterations,
            "sizes": sizes,
            "centroids": model.centroids,
        }));
    }

    println!(
        "{} {} points, {} clusters, {} iterations",
        "Model:".bold(),
        model.points.len(),
        model.k(),
        model.iterations
    );
    let mut header = vec!["Cluster", "Size"];
    header.extend(FlavorAxis::ALL.iter().map(|axis| axis.label()));
    let mut table = new_table(header);
    for (i, centroid) in model.centroids.iter().enumerate() {
        let mut row = vec![i.to_string(), sizes[i].to_string()];
        row.extend(centroid.iter().map(|x| format!("{x:.3}")));
        table.add_row(row);
    }
    println!("{table}");
    Ok(())
}

pub fn export(config: &SakemapConfig, output: Option<&Path>) -> Result<()> {
    let engine = engine(config);
    let Some(model) = engine.model()? else {
        bail!("the flavor charts contain no usable records");
    };
    let snapshot = engine.catalog(true)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_cluster_csv(
                BufWriter::new(file),
                &snapshot.brands,
                &model.points,
                &model.assignments,
            )?;
            eprintln!(
                "{} {} rows to {}",
                "Exported".green(),
                model.points.len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_cluster_csv(&mut lock, &snapshot.brands, &model.points, &model.assignments)?;
            lock.flush()?;
        }
    }
    Ok(())
}

pub fn questions(pairs: &[String], format: OutputFormat) -> Result<()> {
    let answers = parse_answers(pairs, None)?;
    let visible = visible_questions(&answers);

    if format == OutputFormat::Json {
        return print_json(&json!({
            "questions": visible,
            "unanswered": unanswered(&answers),
            "complete": is_complete(&answers),
        }));
    }

    for spec in &visible {
        let answered = answers.get(spec.question).filter(|a| spec.accepts(a));
        let marker = if answered.is_some() {
            "✓".green()
        } else {
            "·".normal()
        };
        println!("{marker} {} {}", spec.question.id().bold(), spec.prompt);
        for option in &spec.options {
            if answered == Some(*option) {
                println!("    {}", option.green());
            } else {
                println!("    {option}");
            }
        }
    }
    if is_complete(&answers) {
        println!("\n{}", "All questions answered.".green());
    }
    Ok(())
}

pub fn preference_show(config: &SakemapConfig, format: OutputFormat) -> Result<()> {
    let store = preference_store(config)?;
    let stored = store.load();

    if format == OutputFormat::Json {
        return print_json(&json!({ "preference": stored }));
    }

    match stored {
        Some(v) => {
            let mut table = new_table(vec!["Axis", "Value"]);
            for axis in FlavorAxis::ALL {
                table.add_row(vec![axis.label().to_string(), format!("{:.3}", v[axis.index()])]);
            }
            println!("{table}");
        }
        None => println!("No preference stored."),
    }
    Ok(())
}

pub fn preference_set(config: &SakemapConfig, values: &[f32]) -> Result<()> {
    let store = preference_store(config)?;
    store.save(values)?;
    let saved = sanitize(values)?;
    println!("{} [{}]", "Saved".green(), format_vector(&saved));
    Ok(())
}

pub fn preference_clear(config: &SakemapConfig) -> Result<()> {
    let store = preference_store(config)?;
    store.clear()?;
    println!("Preference cleared.");
    Ok(())
}

pub fn print_config(config: &SakemapConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
