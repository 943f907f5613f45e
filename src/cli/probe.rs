use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::ProbeArgs;
use crate::input::InputSource;
use mpasync::process::detect::{Acceptance, Detector, Verdict};
use mpasync::process::{probe_named, rejected_extension};
use mpasync::utils::errors::ProbeError;

pub fn cmd_probe(args: &ProbeArgs, multi: Option<&MultiProgress>) -> Result<()> {
    let detector = Detector::default();

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(args.inputs.len() as u64));
            pb.set_style(ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} inputs\n{msg} | elapsed: {elapsed_precise}",
            )?);
            Some(pb)
        }
        None => None,
    };

    let mut accepted = 0usize;

    for path in &args.inputs {
        let name = path.to_string_lossy();
        if let Some(pb) = &pb {
            pb.set_message(name.to_string());
        }

        // Rejected names are never opened.
        let verdict = match rejected_extension(&name) {
            Some(ext) if !args.no_extension_filter => {
                Verdict::Rejected(ProbeError::RejectedExtension(ext.to_string()))
            }
            _ => match InputSource::open(path) {
                Ok(input) => probe_input(&detector, input, args),
                Err(e) => {
                    log::warn!("{e:#}");
                    if let Some(pb) = &pb {
                        pb.inc(1);
                    }
                    continue;
                }
            },
        };

        if verdict.is_accepted() {
            accepted += 1;
        }

        let line = format!("{name}: {}", verdict_line(&verdict));
        match &pb {
            Some(pb) => {
                pb.suspend(|| println!("{line}"));
                pb.inc(1);
            }
            None => println!("{line}"),
        }
    }

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    log::info!("{accepted} of {} inputs are MPEG audio", args.inputs.len());

    Ok(())
}

fn probe_input(detector: &Detector, input: InputSource, args: &ProbeArgs) -> Verdict {
    let mut input = if args.streaming {
        input.into_streaming()
    } else {
        input
    };

    let name = input.name().to_string();
    if args.no_extension_filter {
        detector.probe(input.source())
    } else {
        probe_named(detector, &name, input.source())
    }
}

fn verdict_line(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Accepted(Acceptance::Frames {
            header,
            offset,
            frames,
        }) => format!("{header} at {offset:#X} ({frames} frames matched)"),
        Verdict::Accepted(Acceptance::RiffRmp3) => "MPEG audio in RIFF/RMP3".to_string(),
        Verdict::Rejected(e) if e.is_fatal() => format!("no frame sync ({e})"),
        Verdict::Rejected(e) => format!("not MPEG audio: {e}"),
    }
}
