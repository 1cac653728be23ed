use anyhow::{Context, Result};
use cli::Cli;
use indicatif::{ProgressBar, ProgressStyle};
use settings::Settings;
use std::process::ExitCode;
use tools::{Pandoc, Toolchain, Wkhtmltoimage, Wkhtmltopdf};

mod assemble;
mod cli;
mod directives;
mod error;
mod links;
mod page;
mod page_ordering;
mod settings;
mod template;
mod tools;
mod wiki_config;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let today = chrono::Local::now().date_naive();
    let settings = Settings::resolve(&cli, today).with_context(|| "Invalid configuration")?;
    log::debug!("{settings:#?}");

    let converter = Pandoc::new(&settings.pandoc, &settings.work_dir);
    let image_renderer = settings.image_renderer.as_ref().map(Wkhtmltoimage::new);
    let pdf_renderer = Wkhtmltopdf::new(&settings.renderer, &settings.work_dir);
    let tools = Toolchain {
        converter: &converter,
        images: image_renderer
            .as_ref()
            .map(|r| r as &dyn tools::ImageRenderer),
        pdf: &pdf_renderer,
    };

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );

    let report = assemble::assemble(&settings, &tools, &progress)
        .with_context(|| format!("Failed to assemble wiki at {}", settings.wiki.display()))?;

    println!();
    println!("  Pages:       {} ({} empty)", report.pages, report.empty_pages);
    println!("  HTML:        {}", report.document.display());
    if !report.images.is_empty() || report.image_failures > 0 {
        println!(
            "  Images:      {} written, {} failed",
            report.images.len(),
            report.image_failures
        );
    }
    match &report.pdf {
        Some(pdf) => println!("  PDF:         {}", pdf.display()),
        None => println!("  PDF:         not rendered"),
    }

    Ok(())
}
