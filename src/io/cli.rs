//! Command-line interface for erasing, clipping and converting grid files

use crate::algorithm::clip::{ClipLimits, ClipMethod, clip_grid_data};
use crate::algorithm::erase::{erase_grid_data, erase_grid_data_parallel};
use crate::io::aoi_file::read_aoi_file;
use crate::io::ascii::{read_ascii_grid_file, write_ascii_grid_file};
use crate::io::codec::{read_grid_file_monitored, read_header, write_grid_file};
use crate::io::configuration::{
    ASCII_GRID_EXTENSIONS, BINARY_GRID_EXTENSION, DEFAULT_LOG_LEVEL, MODSPEC_GRID_EXTENSION,
    OUTPUT_SUFFIX,
};
use crate::io::error::{GridError, Result, file_system_error, invalid_parameter};
use crate::io::modspec::{has_modspec_marker, read_modspec_grid_file, write_modspec_grid_file};
use crate::io::progress::TerminalProgress;
use crate::io::units::{DistanceUnit, UnitPreferences};
use crate::spatial::geometry::{GridGeometry, Point};
use crate::spatial::grid::Grid3d;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridmask")]
#[command(
    author,
    version,
    about = "Erase, clip and convert corner-point grid files"
)]
/// Command-line arguments for the grid editing tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Horizontal unit of coordinates stored in grid files
    #[arg(long, global = true, default_value = "undefined")]
    pub xy_unit: DistanceUnit,

    /// Horizontal unit to work in; file coordinates are converted into it on
    /// read and back on write (`undefined` keeps the file unit)
    #[arg(long, global = true, default_value = "undefined")]
    pub app_unit: DistanceUnit,

    /// Replace the null sentinel of loaded grids
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub null_value: Option<f32>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Geometry for binary grids as `x0,y0,dx,dy,angle`
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub geometry: Option<GeometrySpec>,
}

/// Grid operations
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Null every cell inside an area of interest
    Erase {
        /// Grid file to edit
        grid: PathBuf,
        /// Area-of-interest polygon file
        #[arg(long)]
        aoi: PathBuf,
        /// Output file (defaults to `<name>_edit.<ext>` beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Process rows in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Clip values to a range, optionally inside an area of interest
    Clip {
        /// Grid file to edit
        grid: PathBuf,
        /// Lower clip limit
        #[arg(long, allow_hyphen_values = true)]
        min: f32,
        /// Upper clip limit
        #[arg(long, allow_hyphen_values = true)]
        max: f32,
        /// Replacement for out-of-range values: nulls, limits or constant
        #[arg(long, default_value = "nulls")]
        method: String,
        /// Replacement value for the constant method
        #[arg(long, allow_hyphen_values = true)]
        constant: Option<f32>,
        /// Area-of-interest polygon file; cells outside become null
        #[arg(long)]
        aoi: Option<PathBuf>,
        /// Output file (defaults to `<name>_edit.<ext>` beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print grid geometry and value statistics
    Info {
        /// Grid file to describe
        grid: PathBuf,
    },
    /// Rewrite a grid in the format implied by the output extension
    Convert {
        /// Grid file to read
        grid: PathBuf,
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Application unit preferences for file coordinate conversion
    pub const fn unit_preferences(&self) -> UnitPreferences {
        UnitPreferences::new(self.app_unit)
    }

    /// Log filter from `RUST_LOG`, falling back to `--log-level`
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Origin, spacing and rotation for grids whose files carry no geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySpec {
    /// World position of node (0, 0)
    pub origin: Point,
    /// Distance between columns
    pub col_spacing: f64,
    /// Distance between rows
    pub row_spacing: f64,
    /// Column direction from +x, in degrees
    pub rotation_degrees: f64,
}

impl GeometrySpec {
    /// Geometry with the given dimensions
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` for non-positive spacing or empty dimensions
    pub fn build(&self, num_rows: usize, num_cols: usize) -> Result<GridGeometry> {
        GridGeometry::from_origin(
            self.origin,
            self.col_spacing,
            self.row_spacing,
            num_rows,
            num_cols,
            self.rotation_degrees,
        )
    }
}

impl FromStr for GeometrySpec {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let fields = s
            .split(',')
            .map(|field| field.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| invalid_parameter("geometry", &s, &err))?;
        match fields.as_slice() {
            &[x0, y0, dx, dy, angle] => Ok(Self {
                origin: Point::new(x0, y0),
                col_spacing: dx,
                row_spacing: dy,
                rotation_degrees: angle,
            }),
            _ => Err(invalid_parameter(
                "geometry",
                &s,
                &"expected five comma-separated numbers x0,y0,dx,dy,angle",
            )),
        }
    }
}

/// On-disk grid formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    /// ASCII `ModSpec` text grid
    Ascii,
    /// Binary header plus little-endian samples, without geometry
    Binary,
    /// Legacy binary `ModSpec` grid with a text geometry header
    ModSpec,
}

impl GridFormat {
    /// Format implied by the extension of `path`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unrecognised extensions
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension == BINARY_GRID_EXTENSION {
            Ok(Self::Binary)
        } else if extension == MODSPEC_GRID_EXTENSION {
            Ok(Self::ModSpec)
        } else if ASCII_GRID_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Ascii)
        } else {
            Err(invalid_parameter(
                "grid",
                &path.display(),
                &format!(
                    "unsupported extension, expected .{BINARY_GRID_EXTENSION}, .{MODSPEC_GRID_EXTENSION} or one of {ASCII_GRID_EXTENSIONS:?}"
                ),
            ))
        }
    }

    /// Format of an existing file
    ///
    /// The extension decides, except that a file with an ASCII extension that
    /// starts with the binary `ModSpec` marker is read as `ModSpec`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unrecognised extensions, or
    /// `FileSystem` if an ASCII-named file cannot be read
    pub fn detect(path: &Path) -> Result<Self> {
        let format = Self::from_path(path)?;
        if format != Self::Ascii {
            return Ok(format);
        }
        let mut file = File::open(path).map_err(|e| file_system_error(path, "open grid", e))?;
        if has_modspec_marker(&mut file)? {
            Ok(Self::ModSpec)
        } else {
            Ok(format)
        }
    }
}

/// Default output path: the input stem with `OUTPUT_SUFFIX`, same extension
pub fn output_path(input_path: &Path) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let output_name = match input_path.extension() {
        Some(extension) => format!(
            "{}{}.{}",
            stem.to_string_lossy(),
            OUTPUT_SUFFIX,
            extension.to_string_lossy()
        ),
        None => format!("{}{}", stem.to_string_lossy(), OUTPUT_SUFFIX),
    };

    if let Some(parent) = input_path.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}

/// Runs one command against grid files
pub struct GridRunner {
    cli: Cli,
}

impl GridRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    fn progress(&self, message: String) -> TerminalProgress {
        if self.cli.should_show_progress() {
            TerminalProgress::new(message)
        } else {
            TerminalProgress::hidden()
        }
    }

    /// Execute the parsed command
    ///
    /// # Errors
    ///
    /// Returns any load, edit or save error; cancelled edits return `Cancelled`
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        match &self.cli.command {
            Command::Erase {
                grid,
                aoi,
                output,
                parallel,
            } => self.erase(grid, aoi, output.as_deref(), *parallel)?,
            Command::Clip {
                grid,
                min,
                max,
                method,
                constant,
                aoi,
                output,
            } => {
                let limits = ClipLimits::new(*min, *max)?;
                let method = ClipMethod::parse(method, *constant)?;
                self.clip(grid, limits, method, aoi.as_deref(), output.as_deref())?;
            }
            Command::Info { grid } => self.info(grid)?,
            Command::Convert { grid, output } => {
                let loaded = self.load_grid(grid)?;
                self.save_grid(&loaded, output)?;
            }
        }
        info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "command finished"
        );
        Ok(())
    }

    fn erase(&self, path: &Path, aoi_path: &Path, output: Option<&Path>, parallel: bool) -> Result<()> {
        let mut grid = self.load_grid(path)?;
        let aoi = read_aoi_file(aoi_path)?;
        let progress = self.progress(format!("Erasing {}", grid.name()));
        let outcome = if parallel {
            erase_grid_data_parallel(&grid, &aoi, &progress)
        } else {
            erase_grid_data(&grid, &aoi, &progress)
        };
        grid.set_values(outcome.into_result()?)?;
        self.save_grid(&grid, &output.map_or_else(|| output_path(path), Path::to_path_buf))
    }

    fn clip(
        &self,
        path: &Path,
        limits: ClipLimits,
        method: ClipMethod,
        aoi_path: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<()> {
        let mut grid = self.load_grid(path)?;
        let aoi = aoi_path.map(read_aoi_file).transpose()?;
        let progress = self.progress(format!("Clipping {}", grid.name()));
        let outcome = clip_grid_data(&grid, aoi.as_ref(), limits, method, &progress);
        grid.set_values(outcome.into_result()?)?;
        self.save_grid(&grid, &output.map_or_else(|| output_path(path), Path::to_path_buf))
    }

    // Allow print for the report this command exists to produce
    #[allow(clippy::print_stdout)]
    fn info(&self, path: &Path) -> Result<()> {
        let grid = self.load_grid(path)?;
        let geometry = grid.geometry();
        let units = UnitPreferences::new(self.cli.unit_preferences().resolve(self.cli.xy_unit));
        let [origin, ..] = *geometry.corner_points();

        println!("name:       {}", grid.name());
        println!("size:       {} rows x {} cols", grid.num_rows(), grid.num_cols());
        println!(
            "origin:     {}, {}",
            units.format_distance(origin.x),
            units.format_distance(origin.y)
        );
        println!(
            "spacing:    {} (col), {} (row)",
            units.format_distance(geometry.col_spacing()),
            units.format_distance(geometry.row_spacing())
        );
        println!("rotation:   {:.3} deg", geometry.rotation_degrees());
        println!("rectangular: {}", geometry.is_rectangular());
        println!("null value: {}", grid.null_value());
        println!("null cells: {}", grid.null_count());
        println!("range:      {} .. {}", grid.min_value(), grid.max_value());
        Ok(())
    }

    /// Load a grid, choosing the reader from [`GridFormat::detect`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unknown extensions or a binary grid
    /// without `--geometry`, or any reader error
    pub fn load_grid(&self, path: &Path) -> Result<Grid3d> {
        let mut grid = match GridFormat::detect(path)? {
            GridFormat::Ascii => {
                read_ascii_grid_file(path, self.cli.xy_unit, self.cli.unit_preferences())?
            }
            GridFormat::Binary => {
                let spec = self.cli.geometry.ok_or_else(|| {
                    invalid_parameter(
                        "geometry",
                        &"<none>",
                        &"binary grids need --geometry x0,y0,dx,dy,angle",
                    )
                })?;
                let file =
                    File::open(path).map_err(|e| file_system_error(path, "open grid", e))?;
                let header = read_header(&mut BufReader::new(file))?;
                let geometry = spec.build(header.num_rows, header.num_cols)?;
                let name = path
                    .file_stem()
                    .map_or_else(|| "grid".to_string(), |s| s.to_string_lossy().into_owned());
                let progress = self.progress(format!("Reading {name}"));
                read_grid_file_monitored(path, geometry, name, &progress)?
            }
            GridFormat::ModSpec => {
                let progress = self.progress(format!("Reading {}", path.display()));
                read_modspec_grid_file(
                    path,
                    self.cli.xy_unit,
                    self.cli.unit_preferences(),
                    &progress,
                )?
            }
        };
        if let Some(null_value) = self.cli.null_value {
            grid.set_null_value(null_value)?;
        }
        info!(
            grid = grid.name(),
            rows = grid.num_rows(),
            cols = grid.num_cols(),
            "loaded grid"
        );
        Ok(grid)
    }

    /// Save a grid, choosing the writer from the file extension
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unknown extensions, or any writer error
    pub fn save_grid(&self, grid: &Grid3d, path: &Path) -> Result<()> {
        match GridFormat::from_path(path)? {
            GridFormat::Ascii => {
                write_ascii_grid_file(grid, path, self.cli.xy_unit, self.cli.unit_preferences())?;
            }
            GridFormat::Binary => {
                let written = write_grid_file(grid, path)?;
                info!(path = %path.display(), written, "binary grid written without geometry");
            }
            GridFormat::ModSpec => {
                let written = write_modspec_grid_file(
                    grid,
                    path,
                    self.cli.xy_unit,
                    self.cli.unit_preferences(),
                )?;
                info!(path = %path.display(), written, "modspec grid written");
            }
        }
        Ok(())
    }
}
