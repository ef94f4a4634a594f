use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use muellplan_core::{JsonScheduleStore, PipelineConfig, ScheduleService, ZoneCode, compile_year};
use muellplan_ocr::{Progress, TesseractRecognizer, extract_pages};
use serde::Serialize;
use tracing::{debug, info};

pub(crate) fn extract(config: &PipelineConfig) -> Result<()> {
    if config.pages.is_empty() {
        anyhow::bail!("no calendar pages configured");
    }
    let recognizer = Arc::new(TesseractRecognizer::new(&config.ocr));
    let report = |image: &Path, step: Progress| {
        if step.done == step.total {
            info!(image = %image.display(), cells = step.total, "page digitized");
        } else {
            debug!(image = %image.display(), done = step.done, total = step.total, "digitizing");
        }
    };

    let written = extract_pages(config, recognizer, &report).context("extraction failed")?;
    let mut stdout = io::stdout().lock();
    for path in written {
        writeln!(stdout, "{}", path.display())?;
    }
    Ok(())
}

pub(crate) fn compile(config: &PipelineConfig) -> Result<()> {
    let path = compile_year(config)
        .with_context(|| format!("failed to compile the {} schedule", config.year))?;
    writeln!(io::stdout(), "{}", path.display())?;
    Ok(())
}

pub(crate) fn next(
    config: &PipelineConfig,
    zone: ZoneCode,
    date: Option<NaiveDate>,
    datasets: Vec<PathBuf>,
) -> Result<()> {
    let service = service(config, datasets);
    let result = match date {
        Some(today) => service.next_pickups_on(zone, today),
        None => service.next_pickups(zone),
    }?;
    print_json(&result)
}

pub(crate) fn schedule(
    config: &PipelineConfig,
    zone: ZoneCode,
    date: Option<NaiveDate>,
    datasets: Vec<PathBuf>,
) -> Result<()> {
    let service = service(config, datasets);
    let schedule = match date {
        Some(today) => service.future_pickups_on(zone, today),
        None => service.future_pickups(zone),
    }?;
    print_json(&schedule)
}

pub(crate) fn zones(config: &PipelineConfig, datasets: Vec<PathBuf>) -> Result<()> {
    let zones = service(config, datasets).zones()?;
    let mut stdout = io::stdout().lock();
    for zone in zones {
        writeln!(stdout, "{zone}")?;
    }
    Ok(())
}

fn service(config: &PipelineConfig, datasets: Vec<PathBuf>) -> ScheduleService {
    let paths = if datasets.is_empty() {
        vec![config.dataset_path()]
    } else {
        datasets
    };
    ScheduleService::new(Arc::new(JsonScheduleStore::new(paths)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
