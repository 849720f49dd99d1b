//! isomesh CLI - isotropic remeshing from the command line.
//!
//! Usage: isomesh <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `isomesh --help` for available commands.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};

use isomesh::algo::features::detect_sharp_edges;
use isomesh::algo::remesh::{self, RelaxationWeighting, RemeshOptions, SplitOptions};
use isomesh::algo::{Phase, Progress};
use isomesh::io::{self, Format};
use isomesh::mesh::{EdgeId, FaceId, HalfEdgeMesh};

#[derive(Parser)]
#[command(name = "isomesh")]
#[command(author, version, about = "Isotropic remeshing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Also count edges sharper than this dihedral angle (degrees)
        #[arg(long)]
        sharp_angle: Option<f64>,
    },

    /// Remesh toward a uniform edge length
    Remesh {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Target edge length (default: average edge length)
        #[arg(short = 'l', long)]
        target_length: Option<f64>,

        /// Number of iterations
        #[arg(short, long, default_value = "5")]
        iterations: usize,

        /// Relaxation steps per iteration
        #[arg(short, long, default_value = "1")]
        relaxation_steps: usize,

        /// Constrain edges whose dihedral angle exceeds this (degrees)
        #[arg(long)]
        sharp_angle: Option<f64>,

        /// Never split or collapse constrained edges
        #[arg(long)]
        protect: bool,

        /// Split constrained edges to 4/3 of the target first (implies --protect)
        #[arg(long)]
        presplit: bool,

        /// Slide constrained vertices along their polylines
        #[arg(long)]
        relax_constraints: bool,

        /// Skip projection back onto the input surface
        #[arg(long)]
        no_project: bool,

        /// Relax toward the plain neighbour average instead of the area-weighted centroid
        #[arg(long)]
        uniform: bool,

        /// Read and write per-face patch ids (PLY only)
        #[arg(long)]
        patches: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Split long edges without remeshing
    Split {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Maximum edge length
        #[arg(short, long)]
        max_length: f64,

        /// Only split edges whose dihedral angle exceeds this (degrees)
        #[arg(long)]
        sharp_angle: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, sharp_angle } => cmd_info(&input, sharp_angle)?,

        Commands::Remesh {
            input,
            output,
            target_length,
            iterations,
            relaxation_steps,
            sharp_angle,
            protect,
            presplit,
            relax_constraints,
            no_project,
            uniform,
            patches,
            sequential,
        } => {
            let settings = RemeshSettings {
                target_length,
                iterations,
                relaxation_steps,
                sharp_angle,
                protect: protect || presplit,
                presplit,
                relax_constraints,
                project: !no_project,
                weighting: if uniform {
                    RelaxationWeighting::Uniform
                } else {
                    RelaxationWeighting::Area
                },
                patches,
                parallel: !sequential,
            };
            cmd_remesh(&input, &output, &settings)?;
        }

        Commands::Split {
            input,
            output,
            max_length,
            sharp_angle,
        } => cmd_split(&input, &output, max_length, sharp_angle)?,
    }

    Ok(())
}

/// Phases reported per iteration, in order.
const PHASES_PER_ITERATION: usize = 5;

fn phase_offset(phase: Phase) -> usize {
    match phase {
        Phase::Split => 0,
        Phase::Collapse => 1,
        Phase::EqualizeValences => 2,
        Phase::Relax => 3,
        Phase::Project => 4,
        Phase::Uninitialized | Phase::Initialized | Phase::Done => 0,
    }
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = AtomicUsize::new(0);

    Progress::new(move |event| {
        let total = event.total_iterations * PHASES_PER_ITERATION;
        if total == 0 {
            return;
        }
        let current = match event.phase {
            Phase::Done => total,
            phase => event.iteration * PHASES_PER_ITERATION + phase_offset(phase),
        };
        let percent = (current * 100 + total / 2) / total;

        // Only redraw when the bar moves forward
        if max_percent.fetch_max(percent, Ordering::Relaxed) >= percent && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {:<20}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            percent,
            event.phase.label()
        );
        let _ = std::io::stderr().flush();

        if event.phase == Phase::Done {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path, sharp_angle: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());
    println!("Euler characteristic: {}", mesh.euler_characteristic());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    println!("Edge lengths: {}", remesh::edge_statistics(&mesh));

    let boundary_edges = mesh
        .edge_ids()
        .filter(|e| mesh.is_boundary_edge(e.halfedge()))
        .count();
    if boundary_edges == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary_edges);
    }

    let mut valences = [0usize; 10];
    for v in mesh.vertex_ids().filter(|&v| !mesh.is_boundary_vertex(v)) {
        valences[mesh.valence(v).min(valences.len() - 1)] += 1;
    }
    let histogram: Vec<String> = valences
        .iter()
        .enumerate()
        .filter(|(_, &n)| n > 0)
        .map(|(k, n)| format!("{}{}: {}", k, if k == valences.len() - 1 { "+" } else { "" }, n))
        .collect();
    println!("Interior valences: {}", histogram.join(", "));

    if let Some(angle) = sharp_angle {
        let sharp = detect_sharp_edges(&mesh, angle)?;
        println!("Sharp edges (> {} deg): {}", angle, sharp.len());
    }

    if !mesh.is_valid() {
        println!("Warning: mesh failed the consistency check");
    }

    Ok(())
}

struct RemeshSettings {
    target_length: Option<f64>,
    iterations: usize,
    relaxation_steps: usize,
    sharp_angle: Option<f64>,
    protect: bool,
    presplit: bool,
    relax_constraints: bool,
    project: bool,
    weighting: RelaxationWeighting,
    patches: bool,
    parallel: bool,
}

fn cmd_remesh(
    input: &Path,
    output: &Path,
    settings: &RemeshSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut mesh, mut patch_ids) = load_with_patches(input, settings.patches)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let avg_edge = remesh::average_edge_length(&mesh);
    let target = settings.target_length.unwrap_or(avg_edge);

    println!("Current average edge length: {:.6}", avg_edge);
    println!("Target edge length: {:.6}", target);

    let mut constrained: HashSet<EdgeId> = match settings.sharp_angle {
        Some(angle) => detect_sharp_edges(&mesh, angle)?,
        None => HashSet::new(),
    };
    if !constrained.is_empty() {
        println!("Constrained sharp edges: {}", constrained.len());
    }

    if settings.presplit && target > 0.0 {
        let mut long: Vec<EdgeId> = mesh
            .edge_ids()
            .filter(|e| constrained.contains(e) || mesh.is_boundary_edge(e.halfedge()))
            .collect();
        long.sort();
        let mut split_options = SplitOptions::new().with_edge_constraints(&mut constrained);
        if let Some(ids) = patch_ids.as_mut() {
            split_options = split_options.with_face_patches(ids);
        }
        let report = remesh::split_long_edges(&mut mesh, &long, 4.0 / 3.0 * target, split_options)?;
        println!("Pre-split constrained edges: {} splits", report.splits);
    }

    let faces: Vec<FaceId> = mesh.face_ids().collect();
    let mode = if settings.parallel { "parallel" } else { "sequential" };
    println!("Applying isotropic remeshing ({} iterations, {})...", settings.iterations, mode);

    let mut options = RemeshOptions::new()
        .with_iterations(settings.iterations)
        .with_relaxation_steps(settings.relaxation_steps)
        .with_protect_constraints(settings.protect)
        .with_relax_constraints(settings.relax_constraints)
        .with_projection_enabled(settings.project)
        .with_relaxation_weighting(settings.weighting)
        .with_parallel(settings.parallel)
        .with_edge_constraints(&mut constrained);
    if let Some(ids) = patch_ids.as_mut() {
        options = options.with_face_patches(ids);
    }

    let progress = create_progress();
    let start = Instant::now();
    let report = remesh::isotropic_remesh_with_progress(&mut mesh, &faces, target, options, &progress)?;
    let elapsed = start.elapsed();

    println!("{}", report);
    println!("Edge lengths before: {}", report.initial_stats);
    println!("Edge lengths after:  {}", report.final_stats);
    println!("Result: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    match patch_ids {
        Some(ids) if Format::from_path(output) == Some(Format::Ply) => {
            io::ply::save_with_patches(&mesh, &ids, output)?
        }
        _ => io::save(&mesh, output)?,
    }
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_split(
    input: &Path,
    output: &Path,
    max_length: f64,
    sharp_angle: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let edges: Vec<EdgeId> = match sharp_angle {
        Some(angle) => {
            let mut sharp: Vec<EdgeId> = detect_sharp_edges(&mesh, angle)?.into_iter().collect();
            sharp.sort();
            sharp
        }
        None => mesh.edge_ids().collect(),
    };
    println!("Splitting {} edges to at most {:.6}...", edges.len(), max_length);

    let start = Instant::now();
    let report = remesh::split_long_edges(&mut mesh, &edges, max_length, SplitOptions::new())?;
    let elapsed = start.elapsed();

    println!("Splits: {}", report.splits);
    println!("Result: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn load_with_patches(
    input: &Path,
    patches: bool,
) -> Result<(HalfEdgeMesh, Option<Vec<usize>>), Box<dyn std::error::Error>> {
    if !patches {
        return Ok((io::load(input)?, None));
    }
    if Format::from_path(input) != Some(Format::Ply) {
        return Err("--patches requires a PLY input".into());
    }
    let (mesh, ids) = io::ply::load_with_patches(input)?;
    Ok((mesh, Some(ids)))
}
