//! Presentation seam
//!
//! The simulation never touches scene nodes or DOM elements; hosts implement
//! [`Presenter`] and receive one [`FrameResult`] per displayed frame.

use crate::sim::{FrameResult, GameEvent};

/// Receives frames for drawing
pub trait Presenter {
    fn apply_frame(&mut self, frame: &FrameResult);
}

/// Headless presenter: reports events through the `log` facade and keeps
/// the most recent HUD values
#[derive(Debug, Default)]
pub struct LogPresenter {
    pub frames: u64,
    pub score: u64,
    pub display_speed: u32,
    pub final_score: Option<u64>,
}

impl Presenter for LogPresenter {
    fn apply_frame(&mut self, frame: &FrameResult) {
        self.frames += 1;
        self.score = frame.score;
        self.display_speed = frame.display_speed;

        for event in &frame.events {
            match *event {
                GameEvent::Started => log::info!("Started"),
                GameEvent::Restarted => {
                    self.final_score = None;
                    log::info!("Restarted");
                }
                GameEvent::ScoreChanged { score } => log::trace!("Score {score}"),
                GameEvent::SpeedChanged { speed } => log::trace!("Speed {speed:.4}"),
                GameEvent::GameOver { final_score } => {
                    self.final_score = Some(final_score);
                    log::info!("Game over - final score {final_score}");
                }
            }
        }
    }
}
