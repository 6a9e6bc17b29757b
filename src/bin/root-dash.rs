use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use root_dash::transform::{
    AggregateMode, AggregateSpec, CategoryOrder, Filters, Recategorization, SearchFilter,
    aggregate, filter_frame, recategorize,
};
use root_dash::viz::{self, FilePresenter, LinePlotStyle, StackPlotStyle};
use root_dash::{Frame, SeriesTable, Totals, storage, ticks};

#[derive(Parser, Debug)]
#[command(
    name = "root-dash",
    version,
    about = "Filter, aggregate & plot tabular time series"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a CSV file and draw a line or stacked-area chart.
    Plot(PlotArgs),
    /// Print the default y maximum and tick spacing for a list of totals.
    Ticks(TicksArgs),
    /// Aggregate a CSV file and export the series table.
    Table(TableArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Line,
    Stack,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Count,
    Sum,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Input CSV file with a header row.
    #[arg(short, long)]
    input: PathBuf,
    /// Column holding the time bin (e.g. year).
    #[arg(long)]
    time_column: String,
    /// Column whose values become the plotted categories.
    #[arg(long)]
    groupby: String,
    /// Column summed per bin and category (with --mode sum).
    #[arg(long)]
    y_column: Option<String>,
    #[arg(long, value_enum, default_value_t = Mode::Count)]
    mode: Mode,
    /// Width of the time bins (default 1).
    #[arg(long, default_value_t = 1)]
    bin_width: i64,
    /// Sort categories alphabetically instead of by first appearance.
    #[arg(long, default_value_t = false)]
    sort_categories: bool,
    /// Keep rows whose column value is listed: col=v1,v2 (repeatable).
    #[arg(long = "filter", value_name = "COL=V1,V2")]
    filters: Vec<String>,
    /// Keep rows whose numeric column is in range: col=min:max (repeatable).
    #[arg(long = "range", value_name = "COL=MIN:MAX")]
    ranges: Vec<String>,
    /// Keep rows whose column matches a case-insensitive regex: col=regex.
    #[arg(long, value_name = "COL=REGEX")]
    search: Option<String>,
    /// Fold groupby values with fewer rows than this into "Other".
    #[arg(long)]
    combine_below: Option<usize>,
    /// JSON recategorization (source_column, target_column, mapping, fallback),
    /// applied before filtering.
    #[arg(long, value_name = "FILE")]
    recategorize: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlotArgs {
    #[command(flatten)]
    data: DataArgs,
    #[arg(long, value_enum, default_value_t = Kind::Line)]
    kind: Kind,
    /// Plot running sums along the time axis (line plots).
    #[arg(long, default_value_t = false)]
    cumulative: bool,
    /// JSON style file; unnamed fields keep their defaults.
    #[arg(long)]
    style: Option<PathBuf>,
    /// Categories to draw, separated by comma or semicolon (default: all).
    #[arg(long)]
    categories: Option<String>,
    /// Leave out the black "Total" line.
    #[arg(long, default_value_t = false)]
    no_total: bool,
    /// Output path (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    /// Width of the plot in pixels (overrides the style).
    #[arg(long)]
    width: Option<u32>,
    /// Height of the plot in pixels (overrides the style).
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct TicksArgs {
    /// Totals separated by comma or semicolon (e.g. 10,20,30).
    #[arg(long)]
    totals: String,
    #[arg(long, default_value_t = false)]
    cumulative: bool,
    #[arg(long, default_value_t = ticks::DEFAULT_AXIS_FRACTION)]
    axis_fraction: f64,
    /// Print JSON instead of plain text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct TableArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Output file (format inferred by --format or extension).
    #[arg(short, long)]
    out: PathBuf,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Export running sums instead of per-bin values.
    #[arg(long, default_value_t = false)]
    cumulative: bool,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn split_assignment<'a>(s: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    s.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .with_context(|| format!("invalid --{flag} '{s}', expected COL=VALUE"))
}

fn parse_range(s: &str) -> Result<(String, (f64, f64))> {
    let (col, range) = split_assignment(s, "range")?;
    let (lo, hi) = range
        .split_once(':')
        .with_context(|| format!("invalid --range '{s}', expected COL=MIN:MAX"))?;
    let lo: f64 = lo.trim().parse().with_context(|| format!("invalid minimum in --range '{s}'"))?;
    let hi: f64 = hi.trim().parse().with_context(|| format!("invalid maximum in --range '{s}'"))?;
    Ok((col.to_string(), (lo, hi)))
}

impl DataArgs {
    fn filters(&self) -> Result<Filters> {
        let mut categorical: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for f in &self.filters {
            let (col, values) = split_assignment(f, "filter")?;
            categorical
                .entry(col.to_string())
                .or_default()
                .extend(parse_list(values));
        }
        let numerical = self
            .ranges
            .iter()
            .map(|r| parse_range(r))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let search = match &self.search {
            Some(s) => {
                let (column, pattern) = split_assignment(s, "search")?;
                Some(SearchFilter {
                    column: column.to_string(),
                    pattern: pattern.to_string(),
                })
            }
            None => None,
        };
        Ok(Filters {
            search,
            categorical,
            numerical,
        })
    }

    fn spec(&self) -> AggregateSpec {
        let base = match self.mode {
            Mode::Count => AggregateSpec::count(&self.time_column, &self.groupby),
            Mode::Sum => AggregateSpec {
                mode: AggregateMode::Sum,
                y_column: self.y_column.clone(),
                ..AggregateSpec::count(&self.time_column, &self.groupby)
            },
        };
        AggregateSpec {
            bin_width: self.bin_width,
            order: if self.sort_categories {
                CategoryOrder::Sorted
            } else {
                CategoryOrder::FirstSeen
            },
            ..base
        }
    }

    /// Load, recategorize, filter and aggregate.
    fn load(&self) -> Result<(SeriesTable, Totals)> {
        let frame = Frame::from_csv_path(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let frame = match &self.recategorize {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let recat: Recategorization = serde_json::from_str(&text)
                    .with_context(|| format!("invalid recategorization in {}", path.display()))?;
                recategorize(&frame, &recat)?
            }
            None => frame,
        };
        let mut frame = filter_frame(&frame, &self.filters()?)?;
        if let Some(min_count) = self.combine_below {
            frame = recategorize(
                &frame,
                &Recategorization {
                    source_column: self.groupby.clone(),
                    target_column: self.groupby.clone(),
                    mapping: BTreeMap::new(),
                    fallback: None,
                    combine_below: Some(min_count),
                },
            )?;
        }
        Ok(aggregate(&frame, &self.spec())?)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Plot(args) => cmd_plot(args),
        Command::Ticks(args) => cmd_ticks(args),
        Command::Table(args) => cmd_table(args),
    }
}

fn size_in_inches(px: Option<u32>) -> Option<f64> {
    px.map(|p| p as f64 / viz::util::DPI)
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let (table, totals) = args.data.load()?;
    let categories = args.categories.as_deref().map(parse_list);
    let mut presenter = FilePresenter::new(&args.out);

    match args.kind {
        Kind::Line => {
            let mut style = match &args.style {
                Some(p) => LinePlotStyle::from_json_path(p)
                    .with_context(|| format!("failed to read style {}", p.display()))?,
                None => LinePlotStyle::default(),
            };
            if let Some(w) = size_in_inches(args.width) {
                style.fig_width = w;
            }
            if let Some(h) = size_in_inches(args.height) {
                style.fig_height = h;
            }
            // Default y axis: from zero to the padded totals maximum.
            if style.y_lim.is_none() && style.y_scale == viz::AxisScale::Linear {
                match ticks::compute_default_tick_range(totals.values(), args.cumulative) {
                    Ok(range) => {
                        style.y_lim = Some((0.0, range.y_max));
                        if style.ytick_spacing.is_none() {
                            style.ytick_spacing = Some(range.tick_spacing);
                        }
                    }
                    Err(e) if e.is_domain() => {
                        log::warn!("keeping automatic y limits: {e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let overlay = (!args.no_total).then_some(&totals);
            viz::render_lineplot(
                &table,
                overlay,
                categories.as_deref(),
                args.cumulative,
                &style,
                &mut presenter,
            )?;
        }
        Kind::Stack => {
            let mut style = match &args.style {
                Some(p) => StackPlotStyle::from_json_path(p)
                    .with_context(|| format!("failed to read style {}", p.display()))?,
                None => StackPlotStyle::default(),
            };
            if let Some(w) = size_in_inches(args.width) {
                style.fig_width = w;
            }
            if let Some(h) = size_in_inches(args.height) {
                style.fig_height = h;
            }
            viz::render_stackplot(&table, categories.as_deref(), &style, &mut presenter)?;
        }
    }
    eprintln!("Wrote plot to {}", args.out.display());
    Ok(())
}

fn cmd_ticks(args: TicksArgs) -> Result<()> {
    let totals = parse_list(&args.totals)
        .iter()
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid total '{s}'"))
        })
        .collect::<Result<Vec<f64>>>()?;
    let range = ticks::compute_tick_range(&totals, args.cumulative, args.axis_fraction)?;
    if args.json {
        println!("{}", serde_json::to_string(&range)?);
    } else {
        println!("y_max={}", range.y_max);
        println!("tick_spacing={}", range.tick_spacing);
    }
    Ok(())
}

fn infer_format(path: &Path, format: Option<OutFormat>) -> Result<OutFormat> {
    if let Some(f) = format {
        return Ok(f);
    }
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => Ok(OutFormat::Json),
        Some("csv") | None => Ok(OutFormat::Csv),
        Some(other) => anyhow::bail!("unsupported format: {}", other),
    }
}

fn cmd_table(args: TableArgs) -> Result<()> {
    let (table, totals) = args.data.load()?;
    let (table, totals) = if args.cumulative {
        (table.cumulative(), totals.cumulative())
    } else {
        (table, totals)
    };
    match infer_format(&args.out, args.format)? {
        OutFormat::Csv => {
            let f = File::create(&args.out)
                .with_context(|| format!("failed to create {}", args.out.display()))?;
            storage::write_csv(&table, Some(&totals), &args.data.time_column, f)?;
        }
        OutFormat::Json => storage::save_json(&table, Some(&totals), &args.out)?,
    }
    eprintln!("Saved {} rows to {}", table.len(), args.out.display());
    Ok(())
}
