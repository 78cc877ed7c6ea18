mod app;
mod board;
mod chat;
mod dom;
mod fill;
mod geometry;
mod net;
mod persistence;
mod render;
mod session;
mod state;
mod util;
mod ws;

pub use app::run;
