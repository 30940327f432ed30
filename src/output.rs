//! This module is in charge of outputting the final histograms to the log and
//! to disk

use crate::{
    config::Configuration,
    histogram::{Histogram, Histogram1D, Histogram2D, HistogramSet},
    numeric::{reals, Float},
    Result,
};

use eyre::WrapErr;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::Duration,
};

// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

/// Output the reduction results to the log and to disk
pub fn dump_results(
    cfg: &Configuration,
    histograms: &HistogramSet,
    elapsed_time: Duration,
) -> Result<()> {
    // Summarize every histogram in the log
    for (key, histogram) in histograms.iter() {
        tracing::info!(
            histogram = key,
            entries = histogram.entries(),
            "{}",
            histogram.title()
        );
    }

    // Write the histogram contents
    let hist_path = format!("{}.hist", cfg.output_prefix);
    {
        let file = File::create(&hist_path)
            .wrap_err_with(|| format!("Could not create {}", hist_path))?;
        let mut writer = BufWriter::new(file);
        write_histograms(&mut writer, histograms)?;
        writer.flush()?;
    }

    // Write execution timings
    let times_path = format!("{}.times", cfg.output_prefix);
    {
        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let mut file = File::create(&times_path)
            .wrap_err_with(|| format!("Could not create {}", times_path))?;
        write_timings(&mut file, &timestamp, elapsed_time, cfg.num_events)?;
    }

    tracing::info!(
        elapsed_secs = elapsed_time.as_secs_f64(),
        histograms = %hist_path,
        timings = %times_path,
        "results written"
    );
    Ok(())
}

/// Write the contents of every histogram, skipping empty bins
pub fn write_histograms(writer: &mut impl Write, histograms: &HistogramSet) -> io::Result<()> {
    for (key, histogram) in histograms.iter() {
        writeln!(writer, "# {}", key)?;
        write_item(writer, "title", histogram.title())?;
        write_item(writer, "entries", histogram.entries())?;
        match histogram {
            Histogram::OneD(h) => write_1d(writer, h)?,
            Histogram::TwoD(h) => write_2d(writer, h)?,
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_1d(writer: &mut impl Write, h: &Histogram1D) -> io::Result<()> {
    let axis = h.axis();
    write_item(writer, "underflow", Engineering(h.underflow()))?;
    write_item(writer, "overflow", Engineering(h.overflow()))?;
    for bin in 1..=axis.n_bins() {
        let content = h.bin_content(bin);
        if content != 0. {
            writeln!(
                writer,
                "{:>5} {:>14} {:>14}",
                bin,
                Engineering(axis.bin_low_edge(bin)).to_string(),
                Engineering(content).to_string()
            )?;
        }
    }
    Ok(())
}

fn write_2d(writer: &mut impl Write, h: &Histogram2D) -> io::Result<()> {
    let (x_axis, y_axis) = (h.x_axis(), h.y_axis());
    for bin_y in 1..=y_axis.n_bins() {
        for bin_x in 1..=x_axis.n_bins() {
            let content = h.bin_content(bin_x, bin_y);
            if content != 0. {
                writeln!(
                    writer,
                    "{:>5} {:>5} {:>14} {:>14} {:>14}",
                    bin_x,
                    bin_y,
                    Engineering(x_axis.bin_low_edge(bin_x)).to_string(),
                    Engineering(y_axis.bin_low_edge(bin_y)).to_string(),
                    Engineering(content).to_string()
                )?;
            }
        }
    }
    Ok(())
}

/// Write when the run ended and how long it took
pub fn write_timings(
    writer: &mut impl Write,
    timestamp: &str,
    elapsed_time: Duration,
    num_events: usize,
) -> io::Result<()> {
    let elapsed_secs = elapsed_time.as_secs_f64() as Float;
    writeln!(writer, " {}", timestamp)?;
    writeln!(writer, " ---------------------------------------------")?;
    write_item(writer, "Elapsed time (s)", Engineering(elapsed_secs))?;
    write_item(
        writer,
        "Elapsed time per event (s)",
        Engineering(elapsed_secs / (num_events as Float)),
    )
}

/// Key-value output that uses fixed-size columns for better readability
fn write_item(writer: &mut impl Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(writer, " {:<31}: {}", key, value)
}

/// Floating-point number displayed in "engineering" notation
///
/// Analogous to the %g format of the C printf function, this switches between
/// naive and scientific notation when the number becomes so small that
/// printing leading zeroes could end up larger than the scientific notation,
/// or so large that we would be forced to print more significant digits than
/// requested.
///
struct Engineering(Float);
//
impl std::fmt::Display for Engineering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let x = self.0;
        let mut precision = SIG_DIGITS - 1;
        if x == 0. {
            // Zero is special because you can't take its log
            return write!(f, "0");
        }
        let log_x = x.abs().log10();
        if log_x >= -3. && log_x <= (SIG_DIGITS as Float) {
            // Rust's precision controls the number of digits after the decimal
            // point, so it must be adjusted to the magnitude of the number
            precision = (precision as isize - log_x.trunc() as isize).max(0) as usize;

            // The leading zero of numbers below 1 is not a significant digit
            if log_x < 0. {
                precision += 1
            }

            // Drop trailing zeros, but be careful with integer numbers...
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    f,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(f, "{}", str_with_zeros)
            }
        } else {
            write!(f, "{:.1$e}", x, precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::HistogramSpec;

    #[test]
    fn engineering_notation() {
        assert_eq!(Engineering(0.).to_string(), "0");
        assert_eq!(Engineering(1.).to_string(), "1");
        assert_eq!(Engineering(1.25).to_string(), "1.25");
        assert_eq!(Engineering(-20.).to_string(), "-20");
        assert_eq!(Engineering(0.04).to_string(), "0.04");
        assert!(Engineering(1e-6).to_string().contains('e'));
        assert!(Engineering(1e20).to_string().contains('e'));
    }

    #[test]
    fn engineering_notation_at_the_fixed_point_limit() {
        let ten: Float = 10.;
        let limit = ten.powi(SIG_DIGITS as i32);
        assert_eq!(Engineering(limit).to_string(), format!("{:.0}", limit));
        assert_eq!(Engineering(-limit).to_string(), format!("{:.0}", -limit));
    }

    #[test]
    fn histogram_dump_lists_non_empty_bins() {
        let mut set = HistogramSet::from_specs(&[
            HistogramSpec::one_d("hVertexZ", "Vertex Z-Coordinate", (100, -20., 20.)),
            HistogramSpec::two_d("hTPCResponse", "TPC Response", (100, 0., 4.), (250, 0., 250.)),
        ])
        .unwrap();
        set.fill_1d("hVertexZ", 0.1);
        set.fill_1d("hVertexZ", 25.);
        set.fill_2d("hTPCResponse", 1.3, 55.);

        let mut buffer = Vec::new();
        write_histograms(&mut buffer, &set).unwrap();
        let dump = String::from_utf8(buffer).unwrap();
        let lines = dump.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "# hVertexZ");
        assert!(lines[1].contains("Vertex Z-Coordinate"));
        assert!(lines[2].ends_with(": 2"));
        assert!(lines[4].ends_with(": 1"));
        assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), ["51", "0", "1"]);
        assert!(dump.contains("# hTPCResponse"));
        assert!(dump
            .lines()
            .any(|line| line.split_whitespace().collect::<Vec<_>>() == ["33", "56", "1.28", "55", "1"]));
    }

    #[test]
    fn timings_report_per_event_cost() {
        let mut buffer = Vec::new();
        write_timings(
            &mut buffer,
            "2022-11-15T10:00:00Z",
            Duration::from_secs(2),
            1000,
        )
        .unwrap();
        let report = String::from_utf8(buffer).unwrap();
        assert!(report.starts_with(" 2022-11-15T10:00:00Z"));
        assert!(report.contains("Elapsed time (s)"));
        assert!(report.contains(": 0.002"));
    }
}
