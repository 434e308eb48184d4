//! mediapick - Materialize picked photos and videos as local files

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mediapick_core::{
    MediaFilter, MediaLibrary, MediaPicker, PageRequest, PickOptions, PickerSettings, ProcessingEvent,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod cli;
mod library;

use cli::{Cli, Commands};
use library::{DirectoryGate, DirectoryLibrary, FileListSurface};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut clog = colog::default_builder();
    clog.filter(None, level);
    clog.init();
}

fn settings_from(cli: &Cli) -> PickerSettings {
    PickerSettings {
        cache_dir: cli.cache_dir.clone(),
        jpeg_quality: cli.jpeg_quality,
        worker_threads: cli.threads,
        provider_timeout: cli.timeout_secs.map(Duration::from_secs),
        ..Default::default()
    }
}

/// Drive a progress bar from picker events until the channel closes or ends
fn spawn_progress(events: flume::Receiver<ProcessingEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut bar: Option<ProgressBar> = None;
        for event in events.iter() {
            match event {
                ProcessingEvent::Begin { total } => {
                    let pb = ProgressBar::new(total as u64);
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    {
                        pb.set_style(style.progress_chars("#>-"));
                    }
                    pb.set_message("Processing...");
                    bar = Some(pb);
                }
                ProcessingEvent::ItemFinished { index, ok } => {
                    if let Some(pb) = &bar {
                        if !ok {
                            pb.println(format!("item {index} failed"));
                        }
                        pb.inc(1);
                    }
                }
                ProcessingEvent::End => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                    break;
                }
            }
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = settings_from(&cli);

    match cli.command {
        Commands::Pick {
            files,
            limit,
            image_only,
            media_type,
            no_loader,
            partial,
        } => {
            let mut picker = MediaPicker::new(settings)?;
            let options = PickOptions {
                selection_limit: limit,
                show_loader: !no_loader,
                image_only,
                media_type: media_type.map(MediaFilter::from),
            };
            let events = picker.subscribe();
            let progress = options.show_loader.then(|| spawn_progress(events));
            let surface = FileListSurface::new(files);

            let output = if partial {
                let report = picker.get_medias_partial(&options, &surface)?;
                for err in &report.errors {
                    log::error!("{}", err);
                }
                serde_json::to_string_pretty(&report.results)?
            } else {
                let results = picker.get_medias(&options, &surface)?;
                serde_json::to_string_pretty(&results)?
            };

            // Dropping the picker closes the event channel
            drop(picker);
            if let Some(handle) = progress {
                let _ = handle.join();
            }
            println!("{output}");
            Ok(())
        }

        Commands::Last {
            library,
            limit,
            offset,
            media_type,
        } => {
            let picker = MediaPicker::new(settings)?;
            let gate = DirectoryGate::new(&library);
            let media: Arc<dyn MediaLibrary> = Arc::new(DirectoryLibrary::scan(&library)?);
            let request = PageRequest::new(limit, offset, MediaFilter::from(media_type));

            let page = picker
                .get_last_medias(&request, media, &gate)
                .with_context(|| format!("Cannot list {}", library.display()))?;
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }

        Commands::Exif { file, key } => {
            let picker = MediaPicker::new(settings)?;
            let value = picker.get_exif_for_key(&file, &key);
            println!("{}", serde_json::to_string(&value)?);
            Ok(())
        }
    }
}
