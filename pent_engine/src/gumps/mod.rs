//! Concrete gump kinds and their behaviour hooks.

mod bark;
mod button;
mod container;
mod desktop;
mod game_map;
mod item_relative;
mod modal;
mod paged;
mod scaler;
mod slider;
mod target;

pub use bark::BarkGump;
pub use button::ButtonWidget;
pub use container::ContainerGump;
pub use desktop::DesktopGump;
pub use game_map::game_map_gump;
pub use item_relative::ItemRelativeGump;
pub use modal::ModalGump;
pub use paged::{PagedGump, PAGE_NEXT_SHAPE, PAGE_PREV_SHAPE};
pub use scaler::ScalerGump;
pub use slider::{
    sliding_widget, SliderGump, SLIDER_LEFT_INDEX, SLIDER_OK_INDEX, SLIDER_RIGHT_INDEX,
    SLIDER_WIDGET_INDEX,
};
pub use target::TargetGump;
