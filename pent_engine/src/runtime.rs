//! Scripted sessions driven from the command line.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::audio::SampleMixer;
use crate::cli::{DemoArgs, InspectArgs};
use crate::config::EngineConfig;
use crate::context::GameContext;
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind, LAYER_NORMAL};
use crate::gumps::{ContainerGump, PagedGump, PAGE_NEXT_SHAPE, PAGE_PREV_SHAPE};
use crate::input::{Key, MouseButton};
use crate::item::Item;
use crate::object_manager::ObjId;
use crate::process::ProcId;
use crate::render::SoftSurface;
use crate::shapes::{Shape, ShapeFrame, ShapeLibrary, ShapeRef, GUMP_SHAPES, MAIN_SHAPES};
use crate::world::Camera;

/// Host time that passes per tick.
pub const FRAME_MS: u64 = 33;

pub const CRATE_SHAPE: ShapeRef = ShapeRef::new(MAIN_SHAPES, 1);
pub const APPLE_SHAPE: ShapeRef = ShapeRef::new(MAIN_SHAPES, 2);
pub const CRATE_GUMP_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 10);

/// Artwork used by the demo and by anything loading its saves.
pub fn demo_shapes() -> ShapeLibrary {
    let crate_frame = ShapeFrame::solid(16, 16, 0x8B5A2B).with_offset(8, 15);
    ShapeLibrary::new()
        .with_shape(CRATE_SHAPE, Shape::new(vec![crate_frame]))
        .with_shape(APPLE_SHAPE, Shape::new(vec![ShapeFrame::solid(4, 4, 0xCC2222)]))
        .with_shape(
            CRATE_GUMP_SHAPE,
            Shape::new(vec![ShapeFrame::solid(80, 64, 0x5C3A1E)]),
        )
        .with_shape(PAGE_PREV_SHAPE, Shape::new(vec![ShapeFrame::solid(8, 8, 0xEEEEEE)]))
        .with_shape(PAGE_NEXT_SHAPE, Shape::new(vec![ShapeFrame::solid(8, 8, 0xEEEEEE)]))
}

pub fn demo_session(config: EngineConfig) -> GameContext {
    GameContext::new(config, Box::new(demo_shapes()), Box::new(SampleMixer::new()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    WaitForBook,
    TurnPage { at: u32 },
    CloseBook { at: u32 },
    WaitForFadeIn,
    DragCrate,
    Done,
}

/// What the demo left behind.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub frames: u32,
    pub frame_num: u32,
    /// Frame on which the fade back in finished.
    pub fade_done_at: Option<u32>,
    pub page_after_click: Option<usize>,
    pub crate_gump: ObjId,
    pub crate_gump_moved_to: (i32, i32),
    pub modal_open: bool,
    pub palette_identity: bool,
    pub cursor: String,
    pub object_types: BTreeMap<&'static str, usize>,
    pub process_types: BTreeMap<String, usize>,
}

struct Demo {
    crate_item: ObjId,
    crate_gump: ObjId,
    fade: ProcId,
    book: ObjId,
    step: Step,
    fade_done_at: Option<u32>,
    page_after_click: Option<usize>,
}

impl Demo {
    /// A crate with two apples in the world, its gump open, a bark over
    /// it, and a two-page book opening behind a fade.
    fn setup(ctx: &mut GameContext) -> Demo {
        ctx.camera = Camera::new(512, 512, 0);
        let crate_item = ctx.objects.add_item(Item::new(CRATE_SHAPE, 0).at(540, 500, 0));
        for (i, x) in [4, 20].into_iter().enumerate() {
            let apple = ctx.objects.add_item(Item::new(APPLE_SHAPE, 0));
            ctx.objects.move_to_container(apple, crate_item, x, 6 + i as i32 * 10);
        }
        let crate_gump = ctx.open_item_gump(
            crate_item,
            ContainerGump::gump(crate_item, CRATE_GUMP_SHAPE, 0, Rect::new(8, 8, 64, 48)),
            None,
        );
        ctx.bark(crate_item, "A sturdy crate.");
        let fade = ctx.open_faded_modal(PagedGump::gump(10, 10, 10, None));
        Demo {
            crate_item,
            crate_gump,
            fade,
            book: 0,
            step: Step::WaitForBook,
            fade_done_at: None,
            page_after_click: None,
        }
    }

    fn after_tick(&mut self, ctx: &mut GameContext, frame: u32, now: u64) {
        match self.step {
            Step::WaitForBook => {
                let Some(book) = ctx.open_modal() else { return };
                if !matches!(ctx.objects.gump_at(book).kind, GumpKind::Paged(_)) {
                    return;
                }
                self.book = book;
                for _ in 0..2 {
                    let page = ctx.init_gump(
                        Gump::new(0, 0, 200, 120, 0, GumpFlags::empty(), LAYER_NORMAL),
                        Some(book),
                        false,
                    );
                    ctx.add_page(book, page);
                }
                log::info!("book {book} opened at frame {frame}");
                self.step = Step::TurnPage { at: frame + 2 };
            }
            Step::TurnPage { at } if frame >= at => {
                let prev = match &ctx.objects.gump_at(self.book).kind {
                    GumpKind::Paged(paged) => paged.prev_button,
                    _ => 0,
                };
                if let Some(bounds) = ctx.screen_bounds(prev) {
                    let (x, y) = (bounds.x + bounds.w / 2, bounds.y + bounds.h / 2);
                    ctx.mouse_motion(x, y);
                    ctx.mouse_down(MouseButton::Left, x, y);
                    ctx.mouse_up(MouseButton::Left, x, y, now);
                }
                self.step = Step::CloseBook { at: frame + 12 };
            }
            Step::CloseBook { at } if frame >= at => {
                self.page_after_click = match ctx.objects.gump(self.book).map(|g| &g.kind) {
                    Some(GumpKind::Paged(paged)) => Some(paged.current),
                    _ => None,
                };
                ctx.key_down(Key::Escape);
                self.step = Step::WaitForFadeIn;
            }
            Step::WaitForFadeIn => {
                if ctx.kernel.process(self.fade).is_none() {
                    self.fade_done_at = Some(frame);
                    self.step = Step::DragCrate;
                }
            }
            Step::DragCrate => {
                if let Some(bounds) = ctx.screen_bounds(self.crate_gump) {
                    let (x, y) = (bounds.x + 2, bounds.y + 2);
                    ctx.mouse_down(MouseButton::Left, x, y);
                    ctx.mouse_motion(x + 20, y + 10);
                    ctx.mouse_motion(x + 40, y + 20);
                    ctx.mouse_up(MouseButton::Left, x + 40, y + 20, now);
                }
                self.step = Step::Done;
            }
            _ => {}
        }
    }
}

/// Runs the scripted session for `ticks` frames.
pub fn run_demo(config: EngineConfig, ticks: u32) -> (GameContext, DemoReport) {
    let mut ctx = demo_session(config);
    let mut demo = Demo::setup(&mut ctx);
    let mut surface = SoftSurface::new(ctx.config.screen_width, ctx.config.screen_height);

    for frame in 0..ticks {
        let now = u64::from(frame) * FRAME_MS;
        ctx.tick(now);
        demo.after_tick(&mut ctx, frame, now);
        surface.reset();
        ctx.paint(&mut surface);
    }

    let moved = ctx
        .objects
        .gump(demo.crate_gump)
        .map(|g| (g.x, g.y))
        .unwrap_or_default();
    log::debug!("demo finished with crate {} at step {:?}", demo.crate_item, demo.step);
    let report = DemoReport {
        frames: ticks,
        frame_num: ctx.kernel.frame_num(),
        fade_done_at: demo.fade_done_at,
        page_after_click: demo.page_after_click,
        crate_gump: demo.crate_gump,
        crate_gump_moved_to: moved,
        modal_open: ctx.is_modal_open(),
        palette_identity: ctx.palette.transform().is_identity(),
        cursor: format!("{:?}", ctx.mouse.cursor()),
        object_types: ctx.objects.object_types(),
        process_types: ctx.kernel.process_types(),
    };
    (ctx, report)
}

pub fn execute_demo(config: EngineConfig, args: DemoArgs) -> Result<()> {
    let (ctx, report) = run_demo(config, args.ticks);

    println!("Ran {} frames (kernel frame {})", report.frames, report.frame_num);
    println!(
        "Book: page after click {:?}, fade finished at frame {:?}",
        report.page_after_click, report.fade_done_at
    );
    println!(
        "Crate gump {} now at {:?}",
        report.crate_gump, report.crate_gump_moved_to
    );
    println!(
        "Modal open: {} | palette identity: {} | cursor: {}",
        report.modal_open, report.palette_identity, report.cursor
    );
    print_counts("Objects", report.object_types.iter().map(|(k, v)| (*k, *v)));
    print_counts("Processes", report.process_types.iter().map(|(k, v)| (k.as_str(), *v)));

    if let Some(path) = args.report_json.as_ref() {
        write_json(path, &report).context("writing demo report")?;
        println!("Saved demo report to {}", path.display());
    }
    if let Some(path) = args.tree_json.as_ref() {
        write_tree(&ctx, path)?;
    }
    if let Some(path) = args.save.as_ref() {
        let bytes = ctx
            .save_game("pent_engine demo", false)
            .context("serializing the demo session")?;
        fs::write(path, bytes)
            .with_context(|| format!("writing savegame to {}", path.display()))?;
        println!("Saved game to {}", path.display());
    }
    Ok(())
}

pub fn execute_inspect(config: EngineConfig, args: InspectArgs) -> Result<()> {
    let bytes = fs::read(&args.save)
        .with_context(|| format!("reading savegame {}", args.save.display()))?;
    let mut ctx = demo_session(config);
    let info = ctx
        .load_game(&bytes)
        .with_context(|| format!("loading savegame {}", args.save.display()))?;

    println!("Savegame \"{}\" (version {})", info.description, info.version);
    println!(
        "Frame {} | camera ({}, {}, {}) | {} processes | {} top-level gumps",
        info.frame_num,
        info.camera.x,
        info.camera.y,
        info.camera.z,
        info.processes,
        info.gumps.len()
    );
    print_counts("Objects", ctx.objects.object_types().into_iter());
    let processes = ctx.kernel.process_types();
    print_counts("Processes", processes.iter().map(|(k, v)| (k.as_str(), *v)));

    if let Some(tree) = ctx.objects.gump_snapshot(ctx.core.desktop) {
        println!("\nGump tree ({} gumps):", tree.count());
        print!("{}", tree.render_text());
    }
    if let Some(path) = args.tree_json.as_ref() {
        write_tree(&ctx, path)?;
    }
    Ok(())
}

fn print_counts<'a>(label: &str, counts: impl Iterator<Item = (&'a str, usize)>) {
    println!("\n{label}:");
    for (name, count) in counts {
        println!("  {name:<24} {count:>4}");
    }
}

fn write_tree(ctx: &GameContext, path: &Path) -> Result<()> {
    if let Some(tree) = ctx.objects.gump_snapshot(ctx.core.desktop) {
        write_json(path, &tree).context("writing gump tree")?;
        println!("Saved gump tree to {}", path.display());
    }
    Ok(())
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing report to JSON")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
