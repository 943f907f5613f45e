use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{InfoArgs, OutputFormat};
use crate::input::InputSource;
use crate::timestamp::time_str;
use mpasync::process::detect::{Acceptance, Detector, Verdict};
use mpasync::process::probe_named;
use mpasync::process::scan::StreamSummary;

pub fn cmd_info(args: &InfoArgs, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing MPEG audio stream: {}", args.input.display());

    let mut input = InputSource::open(&args.input)?;
    if input.is_pipe() {
        log::info!("Probing stdin as a network stream");
    }

    let report = analyze_stream(&mut input, !args.no_extension_filter, args.max_frames, multi)?;

    match args.format {
        OutputFormat::Plain => print!("{}", report.to_plain()),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
    }

    Ok(())
}

fn analyze_stream(
    input: &mut InputSource,
    extension_filter: bool,
    max_frames: Option<usize>,
    multi: Option<&MultiProgress>,
) -> Result<StreamReport> {
    let name = input.name().to_string();
    let detector = Detector::default();
    let verdict = if extension_filter {
        probe_named(&detector, &name, input.source())
    } else {
        detector.probe(input.source())
    };

    let acceptance = match verdict {
        Verdict::Accepted(acceptance) => acceptance,
        Verdict::Rejected(e) => bail!("{name} is not an MPEG audio stream: {e}"),
    };

    let offset = match acceptance {
        Acceptance::Frames { offset, .. } => offset,
        Acceptance::RiffRmp3 => {
            log::warn!("RIFF/RMP3 container, frames are not walked");
            return Ok(StreamReport::container(name, "riff-rmp3"));
        }
    };

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Walking frames...");
            Some(pb)
        }
        None => None,
    };

    let summary = StreamSummary::collect(input.source(), offset, max_frames);

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let Some(summary) = summary? else {
        bail!("No frame found at the locked offset {offset:#X}");
    };

    if summary.truncated {
        log::info!("Stopped after {} frames", summary.frame_count);
    }

    Ok(StreamReport::from_summary(name, &summary))
}

#[derive(Debug, Serialize)]
struct StreamReport {
    input: String,
    container: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<StreamInfo>,
}

#[derive(Debug, Serialize)]
struct StreamInfo {
    version: String,
    layer: u8,
    channel_mode: String,
    channels: u32,
    sample_rate: u32,
    crc: bool,
    offset: u64,
    frames: usize,
    bytes: u64,
    bit_rate: BitRate,
    duration: String,
    truncated: bool,
}

/// kbps
#[derive(Debug, Serialize)]
struct BitRate {
    min: u32,
    avg: u32,
    max: u32,
    vbr: bool,
}

impl StreamReport {
    fn container(input: String, container: &'static str) -> Self {
        Self {
            input,
            container,
            stream: None,
        }
    }

    fn from_summary(input: String, summary: &StreamSummary) -> Self {
        let first = &summary.first;

        Self {
            input,
            container: "elementary",
            stream: Some(StreamInfo {
                version: first.version.to_string(),
                layer: first.layer,
                channel_mode: first.channel_mode.to_string(),
                channels: first.channel_mode.channels(),
                sample_rate: first.sample_rate,
                crc: first.has_crc,
                offset: summary.offset,
                frames: summary.frame_count,
                bytes: summary.total_bytes,
                bit_rate: BitRate {
                    min: summary.min_bit_rate,
                    avg: summary.avg_bit_rate,
                    max: summary.max_bit_rate,
                    vbr: summary.is_vbr(),
                },
                duration: time_str(summary.duration),
                truncated: summary.truncated,
            }),
        }
    }

    fn to_plain(&self) -> String {
        let mut out = String::new();
        let mut line = |label: &str, value: String| out.push_str(&format!("{label:<28}{value}\n"));

        line("Input", self.input.clone());
        line("Container", self.container.to_string());

        if let Some(stream) = &self.stream {
            line("Format", format!("{} Layer {}", stream.version, stream.layer));
            line(
                "Channel mode",
                format!("{} ({} ch)", stream.channel_mode, stream.channels),
            );
            line("Sampling frequency", format!("{} Hz", stream.sample_rate));
            line("CRC protected", yes_no(stream.crc).to_string());
            line("First frame", format!("{:#X}", stream.offset));

            let rate = &stream.bit_rate;
            if rate.vbr {
                line(
                    "Bitrate",
                    format!("VBR {} / {} / {} kbps (min/avg/max)", rate.min, rate.avg, rate.max),
                );
            } else {
                line("Bitrate", format!("CBR {} kbps", rate.avg));
            }

            let suffix = if stream.truncated { " (truncated)" } else { "" };
            line("Frames", format!("{}{suffix}", stream.frames));
            line("Size", format!("{} bytes", stream.bytes));
            line("Duration", stream.duration.clone());
        }

        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_frames(count: usize) -> Result<tempfile::NamedTempFile> {
        write_frames_as(count, ".mp3")
    }

    fn write_frames_as(count: usize, suffix: &str) -> Result<tempfile::NamedTempFile> {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);

        let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        file.write_all(&b"junk".repeat(5))?;
        file.write_all(&frame.repeat(count))?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn report_for_cbr_file() -> Result<()> {
        let file = write_frames(38)?;
        let mut input = InputSource::open(file.path())?;

        let report = analyze_stream(&mut input, true, None, None)?;
        let stream = report.stream.as_ref().unwrap();

        assert_eq!(report.container, "elementary");
        assert_eq!(stream.offset, 20);
        assert_eq!(stream.frames, 38);
        assert_eq!(stream.bytes, 38 * 417);
        assert_eq!(stream.sample_rate, 44100);
        assert!(!stream.bit_rate.vbr);
        // 38 * 1152 / 44100 s
        assert_eq!(stream.duration, "00:00:00.992");

        let plain = report.to_plain();
        assert!(plain.contains("CBR 128 kbps"), "{plain}");
        assert!(plain.contains("MPEG-1 Layer 3"), "{plain}");
        Ok(())
    }

    #[test]
    fn frame_limit_marks_truncation() -> Result<()> {
        let file = write_frames(10)?;
        let mut input = InputSource::open(file.path())?;

        let report = analyze_stream(&mut input, true, Some(4), None)?;
        let stream = report.stream.as_ref().unwrap();
        assert_eq!(stream.frames, 4);
        assert!(stream.truncated);

        let yaml = serde_yaml_ng::to_string(&report)?;
        assert!(yaml.contains("truncated: true"), "{yaml}");
        Ok(())
    }

    #[test]
    fn non_mpeg_input_fails() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"OggS")?;
        file.write_all(&[0u8; 64])?;
        file.flush()?;

        let mut input = InputSource::open(file.path())?;
        let Err(e) = analyze_stream(&mut input, true, None, None) else {
            panic!("expected rejection");
        };
        assert!(e.to_string().contains("Ogg"), "{e}");
        Ok(())
    }

    #[test]
    fn rejected_extension_not_analyzed() -> Result<()> {
        let file = write_frames_as(3, ".flac")?;

        let mut input = InputSource::open(file.path())?;
        let Err(e) = analyze_stream(&mut input, true, None, None) else {
            panic!("expected rejection");
        };
        assert!(e.to_string().contains(".flac is not MPEG audio"), "{e}");

        let mut input = InputSource::open(file.path())?;
        let report = analyze_stream(&mut input, false, None, None)?;
        assert_eq!(report.stream.map(|stream| stream.frames), Some(3));
        Ok(())
    }
}
