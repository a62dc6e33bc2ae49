//! Contagion headless runner
//!
//! Seeds an outbreak in a walled-off room, drives the simulation with
//! 60 Hz frame callbacks until the epidemic burns out, then prints the
//! outcome and an ASCII view of the final scene.
//!
//! `calibrate` instead prints the contact rate (contacts per ball per
//! second) over a grid of ball densities and speeds.
//!
//! Usage:
//! - `contagion [seed] [max-seconds]`
//! - `contagion calibrate [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use contagion::calibration::{CalibrationConfig, sweep};
    use contagion::consts::SIM_DT;
    use contagion::renderer::SceneRenderer;
    use contagion::sim::{Ball, Health, Segment};
    use contagion::{Parameters, Result, Simulation};
    use glam::DVec2;

    const DEFAULT_SEED: u64 = 42;
    const DEFAULT_MAX_SECONDS: f64 = 120.0;
    const GRID_COLS: usize = 80;
    const GRID_ROWS: usize = 28;

    /// Character-cell renderer for the final frame
    struct AsciiCanvas {
        half: DVec2,
        cells: Vec<Vec<char>>,
    }

    impl AsciiCanvas {
        fn new(width: f64, height: f64) -> Self {
            Self {
                half: DVec2::new(width / 2.0, height / 2.0),
                cells: vec![vec![' '; GRID_COLS]; GRID_ROWS],
            }
        }

        fn plot(&mut self, point: DVec2, glyph: char) {
            let u = (point.x + self.half.x) / (2.0 * self.half.x);
            let v = (self.half.y - point.y) / (2.0 * self.half.y);
            if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
                return;
            }
            let col = ((u * (GRID_COLS - 1) as f64).round() as usize).min(GRID_COLS - 1);
            let row = ((v * (GRID_ROWS - 1) as f64).round() as usize).min(GRID_ROWS - 1);
            self.cells[row][col] = glyph;
        }

        fn print(&self) {
            let border: String = std::iter::repeat_n('-', GRID_COLS).collect();
            println!("+{border}+");
            for row in &self.cells {
                println!("|{}|", row.iter().collect::<String>());
            }
            println!("+{border}+");
        }
    }

    impl SceneRenderer for AsciiCanvas {
        fn draw_ball(&mut self, ball: &Ball) {
            let glyph = match ball.health {
                Health::Susceptible => 'o',
                Health::Infected { .. } => '*',
                Health::Recovered => '.',
            };
            self.plot(ball.pos, glyph);
        }

        fn draw_segment(&mut self, segment: &Segment) {
            let steps = (segment.length().ceil() as usize).max(1);
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                self.plot(segment.p1.lerp(segment.p2, t), '#');
            }
        }
    }

    pub fn run() -> Result<()> {
        env_logger::init();

        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.first().is_some_and(|a| a == "calibrate") {
            let seed = args
                .get(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SEED);
            return calibrate(seed);
        }
        let seed = args
            .first()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SEED);
        let max_seconds = args
            .get(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_SECONDS);
        outbreak(seed, max_seconds)
    }

    fn calibrate(seed: u64) -> Result<()> {
        let config = CalibrationConfig {
            seed,
            ..Default::default()
        };
        log::info!(
            "Calibrating contact rates on a {}x{} field (r = {})",
            config.field.width,
            config.field.height,
            config.ball_radius
        );
        let rows = sweep(&config)?;

        let header: String = config
            .speeds
            .iter()
            .map(|v| format!("\tv={v}"))
            .collect();
        println!("packing\tballs{header}");
        for row in rows {
            let rates: String = row
                .contact_rates
                .iter()
                .map(|r| format!("\t{r:.4}"))
                .collect();
            println!("{:.4}\t{}{}", row.packing_fraction, row.balls, rates);
        }
        Ok(())
    }

    fn outbreak(seed: u64, max_seconds: f64) -> Result<()> {
        let params = Parameters {
            target_ball_count: 80,
            infectious_seconds: 8.0,
            transmission_rate: 0.8,
            wall_opening: 12.0,
            ..Default::default()
        };
        let mut sim = Simulation::new(params, seed)?;
        sim.place_wall(20.0)?;
        sim.place_segment(DVec2::new(-70.0, -40.0), DVec2::new(-30.0, -10.0))?;
        if let Some(patient_zero) = sim
            .entities()
            .iter()
            .position(|entity| entity.as_ball().is_some())
        {
            sim.infect(patient_zero)?;
        }

        log::info!("Contagion (native) starting with seed {}", seed);
        sim.start();

        let frames = (max_seconds / SIM_DT).ceil() as u64;
        let mut last_second = 0;
        for _ in 0..frames {
            sim.advance(SIM_DT);
            let second = (sim.current_tick() as f64 * SIM_DT) as u64;
            if second != last_second {
                last_second = second;
                let census = sim.census();
                log::info!(
                    "t={:>4}s  S{:>3} I{:>3} R{:>3}  R0={:.2} Re={:.2}",
                    second,
                    census.susceptible,
                    census.infected,
                    census.recovered,
                    sim.r0(),
                    sim.re()
                );
            }
            if !sim.is_running() {
                break;
            }
        }

        let census = sim.census();
        let peak = sim
            .history()
            .records()
            .iter()
            .map(|r| r.infected)
            .max()
            .unwrap_or(0);
        let top_spreader = sim
            .balls()
            .map(|b| b.reproduction_count)
            .max()
            .unwrap_or(0);

        let mut canvas = AsciiCanvas::new(sim.state().field.width, sim.state().field.height);
        sim.draw(&mut canvas);
        canvas.print();

        println!(
            "Seed {}: {} ticks ({:.1} s), {} contacts counted",
            seed,
            sim.current_tick(),
            sim.current_tick() as f64 * SIM_DT,
            sim.collisions()
        );
        println!(
            "Final census: S{} I{} R{} (peak infected {}, most infections by one ball {})",
            census.susceptible, census.infected, census.recovered, peak, top_spreader
        );
        println!("R0 estimate: {:.2}", sim.r0());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = headless::run() {
        log::error!("{}", err);
        eprintln!("contagion: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm; nothing to run here
}
