mod build;
mod interaction;
mod view;

pub(in crate::app) use interaction::{ZOOM_MAX, ZOOM_MIN};
