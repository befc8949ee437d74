// Copyright (c) 2026 rezky_nightky

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
};

use crate::alphabet::Alphabet;
use crate::surface::Surface;

/// Per-tick chance that a column prepends a new cell even though its top
/// is still being fed.
const FEED_CHANCE: f32 = 0.2;
/// Per-tick chance that an active column starts fading to black.
const FADE_OUT_CHANCE: f32 = 0.002;
/// Chance that a freshly spawned cell carries a leading glow.
const GLOW_CHANCE: f32 = 0.15;
/// A cell may fade at most this much further than the (older) cell below it.
const FADE_SLACK: f32 = 0.0025;
/// Glow is gone once a cell has faded past this point.
const GLOW_FADE_THRESHOLD: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnState {
    Active,
    FadingOut,
}

/// One falling glyph. `y` is in engine pixels, increasing downward and
/// unbounded in both directions.
#[derive(Clone, Debug)]
pub struct GlyphCell {
    pub y: f32,
    pub glyph: char,
    pub fade_progress: f32,
    pub fade_rate: f32,
    pub ticks_until_glyph_change: i32,
    pub fall_speed: f32,
    pub has_leading_glow: bool,
    pub max_glow_radius: f32,
}

/// One vertical lane. `cells[0]` is the most recently spawned cell,
/// nearest the top.
#[derive(Clone, Debug)]
pub struct Column {
    pub cells: Vec<GlyphCell>,
    pub column_alpha: i32,
    pub state: ColumnState,
    pub fade_speed: i32,
}

pub struct Engine {
    text_size: f32,
    column_width: f32,
    min_fall_speed: f32,
    fall_speed_spread: f32,

    width: f32,
    height: f32,
    max_cells_per_column: usize,

    columns: Vec<Column>,
    alphabet: Alphabet,
    rng: StdRng,

    rand_chance: Uniform<f32>,
    rand_cell_count: Uniform<usize>,
    rand_ticks: Uniform<i32>,
    rand_fade_speed: Uniform<i32>,
    rand_start_rows: Uniform<i32>,
}

impl Engine {
    pub fn new(alphabet: Alphabet, text_size: f32, rng: StdRng) -> Result<Self, String> {
        if !text_size.is_finite() || text_size <= 0.0 {
            return Err(format!("text size must be positive, got {}", text_size));
        }
        Ok(Self {
            text_size,
            column_width: text_size * 0.9,
            min_fall_speed: text_size / 20.0,
            fall_speed_spread: text_size * 0.375,
            width: 0.0,
            height: 0.0,
            max_cells_per_column: 0,
            columns: Vec::new(),
            alphabet,
            rng,
            rand_chance: Uniform::new(0.0, 1.0).expect("valid range"),
            rand_cell_count: Uniform::new_inclusive(5, 14).expect("valid range"),
            rand_ticks: Uniform::new_inclusive(5, 14).expect("valid range"),
            rand_fade_speed: Uniform::new_inclusive(2, 6).expect("valid range"),
            rand_start_rows: Uniform::new_inclusive(0, 4).expect("valid range"),
        })
    }

    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    pub fn text_size(&self) -> f32 {
        self.text_size
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[cfg(test)]
    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// (Re)build the whole field for a surface of the given pixel size.
    /// Discards any in-flight animation; safe to call again on every resize.
    pub fn initialize(&mut self, width: u32, height: u32) -> Result<(), String> {
        if width == 0 || height == 0 {
            return Err(format!("surface size must be positive, got {}x{}", width, height));
        }
        self.width = width as f32;
        self.height = height as f32;
        // Feed rule alone cannot bound a column during a long active run,
        // so cap the live cells per column relative to the surface height.
        self.max_cells_per_column =
            ((self.height / self.text_size).ceil() as usize * 3).clamp(32, 192);

        let count = (self.width / self.column_width) as usize + 1;
        self.columns.clear();
        for _ in 0..count {
            let start_y = self.rand_chance.sample(&mut self.rng) * self.height
                - self.text_size * self.rand_start_rows.sample(&mut self.rng) as f32;
            let mut column = Column {
                cells: Vec::new(),
                column_alpha: 255,
                state: ColumnState::Active,
                fade_speed: self.rand_fade_speed.sample(&mut self.rng),
            };
            self.seed_cells(&mut column, start_y);
            self.columns.push(column);
        }
        Ok(())
    }

    /// Advance the simulation by one tick. Columns evolve independently;
    /// their relative order carries no meaning.
    pub fn step(&mut self) {
        let mut columns = std::mem::take(&mut self.columns);
        for column in &mut columns {
            self.step_column(column);
        }
        self.columns = columns;
    }

    /// Emit draw calls for the current state. Mutation is confined to
    /// `step`; rendering twice in a row produces identical output.
    pub fn render<S: Surface>(&self, surface: &mut S) {
        surface.clear();
        for (i, column) in self.columns().iter().enumerate() {
            let x = i as f32 * self.column_width;
            let column_scale = column.column_alpha.clamp(0, 255) as f32 / 255.0;
            for cell in &column.cells {
                let cell_alpha = (255.0 * (1.0 - cell.fade_progress)).clamp(0.0, 255.0);
                let composite = (cell_alpha * column_scale).clamp(0.0, 255.0) as u8;

                if cell.has_leading_glow && cell.fade_progress < GLOW_FADE_THRESHOLD {
                    let glow_factor =
                        1.0 - (cell.fade_progress / GLOW_FADE_THRESHOLD).clamp(0.0, 1.0);
                    let radius = cell.max_glow_radius * glow_factor;
                    if radius > 0.0 {
                        surface.draw_glow(x, cell.y, radius, composite);
                    }
                }
                surface.draw_glyph(x, cell.y, cell.glyph, composite);
            }
        }
    }

    fn step_column(&mut self, column: &mut Column) {
        // Cull cells that have fully left the bottom of the surface.
        let cull_line = self.height + self.text_size;
        column.cells.retain(|c| c.y <= cull_line);

        // Cells fall at different speeds, so a fast upper cell can overtake
        // the ones below it and be culled out of the middle of the column.
        // That splices together a pair whose fades sit further apart than
        // the slack; restore the ordering from the bottom up before the
        // update pass leans on it.
        for j in (0..column.cells.len().saturating_sub(1)).rev() {
            let limit = column.cells[j + 1].fade_progress + FADE_SLACK;
            if column.cells[j].fade_progress > limit {
                column.cells[j].fade_progress = limit;
            }
        }

        // Feed the column from above: always when empty or the top cell is
        // still above the feed line, otherwise at a bursty random rate.
        let top_y = column.cells.first().map(|c| c.y);
        let must_feed = match top_y {
            None => true,
            Some(y) => y < -self.text_size * 0.5,
        };
        if (must_feed || self.rand_chance.sample(&mut self.rng) < FEED_CHANCE)
            && column.cells.len() < self.max_cells_per_column
        {
            let base = top_y.unwrap_or(-self.text_size);
            let y = base - self.text_size * (0.5 + self.rand_chance.sample(&mut self.rng));
            let cell = self.random_cell(y);
            column.cells.insert(0, cell);
        }

        match column.state {
            ColumnState::Active => {
                if self.rand_chance.sample(&mut self.rng) < FADE_OUT_CHANCE {
                    column.state = ColumnState::FadingOut;
                    column.column_alpha = 255;
                    column.fade_speed = self.rand_fade_speed.sample(&mut self.rng);
                }
            }
            ColumnState::FadingOut => {
                column.column_alpha -= column.fade_speed;
                if column.column_alpha <= 0 {
                    self.respawn_column(column);
                    // The fresh cells are this column's work for the tick.
                    return;
                }
            }
        }

        for j in 0..column.cells.len() {
            // Pre-update value of the older neighbor below; the last cell
            // has none and is exempt from the clamp.
            let below = if j + 1 < column.cells.len() {
                Some(column.cells[j + 1].fade_progress)
            } else {
                None
            };

            let cell = &mut column.cells[j];
            cell.ticks_until_glyph_change -= 1;
            if cell.ticks_until_glyph_change <= 0 {
                cell.glyph = self.alphabet.sample(&mut self.rng);
                cell.ticks_until_glyph_change = self.rand_ticks.sample(&mut self.rng);
            }

            cell.fade_progress += cell.fade_rate;
            if let Some(limit) = below {
                cell.fade_progress = cell.fade_progress.min(limit + FADE_SLACK);
            }
            cell.fade_progress = cell.fade_progress.clamp(0.0, 1.0);

            cell.y += cell.fall_speed;
        }
    }

    fn respawn_column(&mut self, column: &mut Column) {
        column.cells.clear();
        let start_y = -(self.rand_chance.sample(&mut self.rng) * self.height * 0.5);
        self.seed_cells(column, start_y);
        column.column_alpha = 255;
        column.state = ColumnState::Active;
        column.fade_speed = self.rand_fade_speed.sample(&mut self.rng);
    }

    /// Fill an empty column with 5-14 fresh cells, the lowest at `start_y`
    /// and the rest stacked upward at glyph spacing, newest first.
    fn seed_cells(&mut self, column: &mut Column, start_y: f32) {
        let count = self.rand_cell_count.sample(&mut self.rng);
        for j in 0..count {
            let y = start_y - (count - 1 - j) as f32 * self.text_size;
            let cell = self.random_cell(y);
            column.cells.push(cell);
        }
    }

    fn random_cell(&mut self, y: f32) -> GlyphCell {
        let has_leading_glow = self.rand_chance.sample(&mut self.rng) < GLOW_CHANCE;
        let max_glow_radius = if has_leading_glow {
            self.text_size * (0.1 + 0.4 * self.rand_chance.sample(&mut self.rng))
        } else {
            0.0
        };
        GlyphCell {
            y,
            glyph: self.alphabet.sample(&mut self.rng),
            fade_progress: 0.0,
            fade_rate: 0.001 + 0.01 * self.rand_chance.sample(&mut self.rng),
            ticks_until_glyph_change: self.rand_ticks.sample(&mut self.rng),
            fall_speed: self.min_fall_speed
                + self.fall_speed_spread * self.rand_chance.sample(&mut self.rng),
            has_leading_glow,
            max_glow_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const TEXT: f32 = 10.0;

    fn make_engine(width: u32, height: u32) -> Engine {
        let mut engine = Engine::new(
            Alphabet::ascii(),
            TEXT,
            StdRng::seed_from_u64(0x1234567),
        )
        .unwrap();
        engine.initialize(width, height).unwrap();
        engine
    }

    #[derive(Default)]
    struct RecordingSurface {
        cleared: usize,
        glyphs: Vec<(f32, f32, char, u8)>,
        glows: Vec<(f32, f32, f32, u8)>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.cleared += 1;
        }
        fn draw_glow(&mut self, x: f32, y: f32, radius: f32, alpha: u8) {
            self.glows.push((x, y, radius, alpha));
        }
        fn draw_glyph(&mut self, x: f32, y: f32, glyph: char, alpha: u8) {
            self.glyphs.push((x, y, glyph, alpha));
        }
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let rng = StdRng::seed_from_u64(1);
        assert!(Engine::new(Alphabet::ascii(), 0.0, rng.clone()).is_err());
        assert!(Engine::new(Alphabet::ascii(), -5.0, rng.clone()).is_err());
        let mut engine = Engine::new(Alphabet::ascii(), TEXT, rng).unwrap();
        assert!(engine.initialize(0, 100).is_err());
        assert!(engine.initialize(100, 0).is_err());
    }

    #[test]
    fn initialize_builds_the_specified_column_count() {
        let engine = make_engine(90, 200);
        // floor(90 / 9) + 1
        assert_eq!(engine.columns().len(), 11);
        for column in engine.columns() {
            assert!((5..=14).contains(&column.cells.len()));
            assert_eq!(column.column_alpha, 255);
            assert_eq!(column.state, ColumnState::Active);
            assert!((2..=6).contains(&column.fade_speed));
        }
    }

    #[test]
    fn initialize_twice_is_idempotent() {
        let mut engine = make_engine(90, 200);
        engine.step();
        engine.step();
        engine.initialize(90, 200).unwrap();
        assert_eq!(engine.columns().len(), 11);
        for column in engine.columns() {
            assert!((5..=14).contains(&column.cells.len()));
            for cell in &column.cells {
                assert_eq!(cell.fade_progress, 0.0);
            }
        }
    }

    #[test]
    fn cells_are_ordered_newest_to_oldest_by_position_at_seed() {
        let engine = make_engine(90, 200);
        for column in engine.columns() {
            for pair in column.cells.windows(2) {
                assert!(pair[0].y < pair[1].y);
            }
        }
    }

    #[test]
    fn fade_ordering_invariant_holds_after_every_step() {
        let mut engine = make_engine(90, 200);
        for _ in 0..2000 {
            engine.step();
            for column in engine.columns() {
                for pair in column.cells.windows(2) {
                    assert!(
                        pair[0].fade_progress <= pair[1].fade_progress + FADE_SLACK + 1e-4,
                        "upper cell faded past its lower neighbor: {} > {}",
                        pair[0].fade_progress,
                        pair[1].fade_progress
                    );
                }
            }
        }
    }

    #[test]
    fn mid_column_cull_keeps_fade_ordering() {
        let mut engine = make_engine(9, 200);
        for column in engine.columns_mut() {
            column.cells.clear();
        }
        // The third cell has overtaken its lower neighbor and sits past
        // the cull line (y > 210). Culling it leaves the second and
        // fourth cells two slacks apart: the update clamp then drags the
        // second cell down toward the fourth while the first stays pinned
        // to the second's stale pre-update fade.
        let fades = [(100.0, 0.9025), (120.0, 0.9000), (215.0, 0.8975), (150.0, 0.8950)];
        {
            let column = &mut engine.columns_mut()[0];
            for (y, fade) in fades {
                column.cells.push(GlyphCell {
                    y,
                    glyph: 'x',
                    fade_progress: fade,
                    fade_rate: 1e-6,
                    ticks_until_glyph_change: 100,
                    fall_speed: 0.1,
                    has_leading_glow: false,
                    max_glow_radius: 0.0,
                });
            }
        }
        engine.step();
        let column = &engine.columns()[0];
        assert!(column.cells.len() >= 2);
        for pair in column.cells.windows(2) {
            assert!(
                pair[0].fade_progress <= pair[1].fade_progress + FADE_SLACK + 1e-4,
                "cull spliced a pair past the slack: {} > {}",
                pair[0].fade_progress,
                pair[1].fade_progress
            );
        }
    }

    #[test]
    fn fade_and_alpha_stay_in_range() {
        let mut engine = make_engine(90, 200);
        for _ in 0..3000 {
            engine.step();
            for column in engine.columns() {
                assert!((0..=255).contains(&column.column_alpha));
                for cell in &column.cells {
                    assert!((0.0..=1.0).contains(&cell.fade_progress));
                    assert!(cell.fade_rate > 0.0);
                    assert!(cell.fall_speed > 0.0);
                }
            }
        }
    }

    #[test]
    fn cell_counts_stay_bounded_over_long_runs() {
        let mut engine = make_engine(9, 100);
        // cap = clamp(3 * ceil(100 / 10), 32, 192) = 32, well under the
        // 50x-initial ceiling (initial count is at least 5).
        for _ in 0..100_000 {
            engine.step();
            for column in engine.columns() {
                assert!(column.cells.len() <= 32);
            }
        }
    }

    #[test]
    fn faded_out_column_respawns_fresh_and_active() {
        let mut engine = make_engine(90, 200);
        {
            let column = &mut engine.columns_mut()[0];
            column.state = ColumnState::FadingOut;
            column.column_alpha = 1;
            column.fade_speed = 255;
        }
        engine.step();
        let column = &engine.columns()[0];
        assert_eq!(column.state, ColumnState::Active);
        assert_eq!(column.column_alpha, 255);
        assert!((5..=14).contains(&column.cells.len()));
        for cell in &column.cells {
            assert_eq!(cell.fade_progress, 0.0);
            assert!(cell.y <= 0.0);
        }
    }

    #[test]
    fn fading_column_loses_alpha_each_tick() {
        let mut engine = make_engine(90, 200);
        {
            let column = &mut engine.columns_mut()[0];
            column.state = ColumnState::FadingOut;
            column.column_alpha = 200;
            column.fade_speed = 4;
        }
        engine.step();
        assert_eq!(engine.columns()[0].column_alpha, 196);
        assert_eq!(engine.columns()[0].state, ColumnState::FadingOut);
    }

    #[test]
    fn empty_column_is_fed_immediately() {
        let mut engine = make_engine(90, 200);
        engine.columns_mut()[0].cells.clear();
        engine.step();
        assert!(!engine.columns()[0].cells.is_empty());
    }

    #[test]
    fn cells_below_the_surface_are_culled() {
        let mut engine = make_engine(90, 200);
        {
            let column = &mut engine.columns_mut()[0];
            column.cells.clear();
            let mut cell = GlyphCell {
                y: 200.0 + TEXT + 100.0,
                glyph: 'x',
                fade_progress: 0.9,
                fade_rate: 0.001,
                ticks_until_glyph_change: 10,
                fall_speed: 1.0,
                has_leading_glow: false,
                max_glow_radius: 0.0,
            };
            column.cells.push(cell.clone());
            cell.y += TEXT;
            column.cells.push(cell);
        }
        engine.step();
        for cell in &engine.columns()[0].cells {
            assert!(cell.y < 200.0 + TEXT);
        }
    }

    #[test]
    fn render_composites_cell_and_column_alpha() {
        let mut engine = make_engine(9, 200);
        for column in engine.columns_mut() {
            column.cells.clear();
        }
        {
            let column = &mut engine.columns_mut()[0];
            column.column_alpha = 128;
            column.cells.push(GlyphCell {
                y: 50.0,
                glyph: 'k',
                fade_progress: 0.5,
                fade_rate: 0.001,
                ticks_until_glyph_change: 10,
                fall_speed: 1.0,
                has_leading_glow: false,
                max_glow_radius: 0.0,
            });
        }
        let mut surface = RecordingSurface::default();
        engine.render(&mut surface);
        assert_eq!(surface.cleared, 1);
        let &(x, y, glyph, alpha) = surface
            .glyphs
            .iter()
            .find(|&&(_, _, g, _)| g == 'k')
            .expect("cell was rendered");
        assert_eq!(x, 0.0);
        assert_eq!(y, 50.0);
        assert_eq!(glyph, 'k');
        // 255 * (1 - 0.5) * (128 / 255) is about 64.
        assert!((63..=65).contains(&alpha));
    }

    #[test]
    fn glow_is_cut_off_past_the_fade_threshold() {
        let mut engine = make_engine(9, 200);
        for column in engine.columns_mut() {
            column.cells.clear();
        }
        {
            let column = &mut engine.columns_mut()[0];
            column.cells.push(GlyphCell {
                y: 50.0,
                glyph: 'g',
                fade_progress: 0.8,
                fade_rate: 0.001,
                ticks_until_glyph_change: 10,
                fall_speed: 1.0,
                has_leading_glow: true,
                max_glow_radius: 20.0,
            });
        }
        let mut surface = RecordingSurface::default();
        engine.render(&mut surface);
        assert!(surface.glows.is_empty());
        assert_eq!(surface.glyphs.len(), engine_glyph_count(&engine));
    }

    #[test]
    fn young_glow_cell_draws_halo_under_glyph() {
        let mut engine = make_engine(9, 200);
        for column in engine.columns_mut() {
            column.cells.clear();
        }
        {
            let column = &mut engine.columns_mut()[0];
            column.cells.push(GlyphCell {
                y: 50.0,
                glyph: 'g',
                fade_progress: 0.0,
                fade_rate: 0.001,
                ticks_until_glyph_change: 10,
                fall_speed: 1.0,
                has_leading_glow: true,
                max_glow_radius: 20.0,
            });
        }
        let mut surface = RecordingSurface::default();
        engine.render(&mut surface);
        let &(_, _, radius, _) = surface.glows.first().expect("glow was drawn");
        assert!((radius - 20.0).abs() < 1e-5);
    }

    fn engine_glyph_count(engine: &Engine) -> usize {
        engine.columns().iter().map(|c| c.cells.len()).sum()
    }
}
