//! Console dialogue driving speech, base facing and pan-tilt tracking
//!
//! The operator picks a question, fills each blank with an object, and the
//! robot says each fragment, turns to the object and points the pan-tilt unit
//! at it. Everything blocks: the dialogue waits on every navigation goal.

use crate::geometry::bearing::heading_to;
use crate::geometry::point::StampedPoint;
use crate::geometry::transform::TransformSource;
use crate::integration::config::SoundboardConfig;
use crate::navigation::{GoalStatus, NavigationClient, NavigationGoal};
use crate::objects::{ObjectCatalog, TrackedObject};
use crate::script::{Question, Script};
use crate::speech::Speaker;
use crate::tracking::PointPublisher;
use crate::{Result, SoundboardError};
use glam::DVec3;
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

/// External services the dialogue delegates to
pub struct Collaborators {
    pub speaker: Box<dyn Speaker>,
    pub navigation: Box<dyn NavigationClient>,
    pub transforms: Box<dyn TransformSource>,
    pub publisher: Box<dyn PointPublisher>,
}

/// Interactive experiment session
pub struct Soundboard {
    config: SoundboardConfig,
    script: Script,
    catalog: ObjectCatalog,
    speaker: Box<dyn Speaker>,
    navigation: Box<dyn NavigationClient>,
    transforms: Box<dyn TransformSource>,
    publisher: Box<dyn PointPublisher>,
}

impl Soundboard {
    /// Create the session once the navigation server is reachable
    pub fn connect(
        config: SoundboardConfig,
        script: Script,
        catalog: ObjectCatalog,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let mut soundboard = Self {
            config,
            script,
            catalog,
            speaker: collaborators.speaker,
            navigation: collaborators.navigation,
            transforms: collaborators.transforms,
            publisher: collaborators.publisher,
        };

        info!(
            "Waiting for navigation server {}",
            soundboard.config.navigation.server
        );
        let timeout = soundboard.config.server_timeout();
        soundboard.navigation.wait_for_server(timeout)?;

        Ok(soundboard)
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn high_level_prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "0: Question")?;
        writeln!(out, "1: Statement")?;
        writeln!(out, "else: Quit")?;
        Ok(())
    }

    pub fn prompt_questions<W: Write>(&self, out: &mut W) -> Result<()> {
        for (i, question) in self.script.questions.iter().enumerate() {
            writeln!(out, "{}: {}", i, question.text())?;
        }
        Ok(())
    }

    pub fn prompt_objects<W: Write>(&self, out: &mut W) -> Result<()> {
        for (i, object) in self.catalog.iter().enumerate() {
            writeln!(out, "{}: {}", i, object.label)?;
        }
        Ok(())
    }

    pub fn prompt_statements<W: Write>(&self, out: &mut W) -> Result<()> {
        for (i, statement) in self.script.statements.iter().enumerate() {
            writeln!(out, "{}: {}", i, statement)?;
        }
        Ok(())
    }

    pub fn print_question<W: Write>(&self, question: &Question, out: &mut W) -> Result<()> {
        writeln!(out, "{}", question.with_blanks())?;
        Ok(())
    }

    /// Run the menu until the operator quits or input ends
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<()> {
        info!("Experiment session started");

        loop {
            self.high_level_prompt(&mut out)?;
            let Some(choice) = read_line(&mut input, &mut out, None)? else {
                break;
            };

            match choice.as_str() {
                "0" => match self.select_question(&mut input, &mut out)? {
                    Selection::Chosen(question) => {
                        self.print_question(&question, &mut out)?;
                        if !self.build_sentence(&question, &mut input, &mut out)? {
                            break;
                        }
                    }
                    Selection::Back => {}
                    Selection::Closed => break,
                },
                "1" => match self.select_statement(&mut input, &mut out)? {
                    Selection::Chosen(statement) => {
                        writeln!(out, "Saying: {}", statement)?;
                        self.say(&statement)?;
                    }
                    Selection::Back => {}
                    Selection::Closed => break,
                },
                _ => break,
            }
        }

        info!("Experiment session ended");
        Ok(())
    }

    /// List the questions until the operator picks a valid one.
    ///
    /// An empty line goes back to the main menu.
    fn select_question<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> Result<Selection<Question>> {
        loop {
            self.prompt_questions(out)?;
            let Some(answer) = read_line(input, out, None)? else {
                return Ok(Selection::Closed);
            };
            if answer.is_empty() {
                return Ok(Selection::Back);
            }

            match parse_index(&answer).and_then(|i| self.script.question(i)) {
                Some(question) => return Ok(Selection::Chosen(question.clone())),
                None => writeln!(out, "No question {}", answer)?,
            }
        }
    }

    fn select_statement<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        out: &mut W,
    ) -> Result<Selection<String>> {
        loop {
            self.prompt_statements(out)?;
            let Some(answer) = read_line(input, out, None)? else {
                return Ok(Selection::Closed);
            };
            if answer.is_empty() {
                return Ok(Selection::Back);
            }

            match parse_index(&answer).and_then(|i| self.script.statement(i)) {
                Some(statement) => return Ok(Selection::Chosen(statement.to_owned())),
                None => writeln!(out, "No statement {}", answer)?,
            }
        }
    }

    /// Ask for one object per blank, then speak and point at each in turn.
    ///
    /// Returns `false` when input ended before every blank was filled; nothing
    /// is spoken in that case.
    pub fn build_sentence<R: BufRead, W: Write>(
        &mut self,
        question: &Question,
        input: &mut R,
        out: &mut W,
    ) -> Result<bool> {
        if question.blanks() > 0 && self.catalog.is_empty() {
            writeln!(out, "No objects loaded")?;
            return Ok(true);
        }

        let mut objects: Vec<TrackedObject> = Vec::with_capacity(question.blanks());
        while objects.len() < question.blanks() {
            self.prompt_objects(out)?;
            let Some(answer) = read_line(input, out, Some("Object:"))? else {
                return Ok(false);
            };

            match parse_index(&answer).and_then(|i| self.catalog.get(i)) {
                Some(object) => objects.push(object.clone()),
                None => writeln!(out, "No object {}", answer)?,
            }
        }

        for (fragment, object) in question.fragments().iter().zip(&objects) {
            writeln!(out, "Saying: {}", fragment)?;
            self.say(fragment)?;
            self.attend_to(object)?;
        }

        if let Some(tail) = question.spoken_tail() {
            writeln!(out, "Saying: {}", tail)?;
            self.say(tail)?;
        }

        Ok(true)
    }

    /// Turn the base toward `position` (world frame) and wait for it to arrive
    pub fn face_point(&mut self, position: DVec3) -> Result<GoalStatus> {
        let frames = &self.config.frames;
        let target = StampedPoint::new(frames.world.as_str(), position);

        self.transforms.wait_for_transform(
            &frames.world,
            &frames.base,
            self.config.base_transform_timeout(),
        )?;
        let in_base = self.transforms.transform_point(&frames.base, &target)?;

        let heading = heading_to(in_base.point)?;
        let goal = NavigationGoal::rotate_in_place(frames.base.as_str(), heading);

        if self.config.debug {
            info!(
                "Sending goal {}",
                serde_json::to_string(&goal).unwrap_or_else(|_| goal.id.to_string())
            );
        }
        debug!("Turning {:.3} rad toward {:?}", heading, position);

        self.navigation.send_goal(goal).map_err(log_unavailable)?;
        debug!("Waiting for navigation result");
        let status = self.navigation.wait_for_result().map_err(log_unavailable)?;

        if status == GoalStatus::Succeeded {
            debug!("Navigation goal done");
        } else {
            warn!("Navigation goal {}", status);
        }
        Ok(status)
    }

    /// Publish `position` (world frame) for the pan-tilt unit to track
    pub fn publish_point(&mut self, position: DVec3) -> Result<()> {
        let frames = &self.config.frames;
        let target = StampedPoint::new(frames.world.as_str(), position);

        self.transforms.wait_for_transform(
            &frames.pan_tilt,
            &frames.world,
            self.config.pan_tilt_transform_timeout(),
        )?;
        let in_pan_tilt = self.transforms.transform_point(&frames.pan_tilt, &target)?;

        debug!(
            "Publishing {:?} in {} on {}",
            in_pan_tilt.point, in_pan_tilt.frame_id, self.config.point_topic
        );
        self.publisher.publish(in_pan_tilt)
    }

    fn say(&self, text: &str) -> Result<()> {
        let speech = &self.config.speech;
        tolerate(
            self.speaker.say(text, &speech.voice, speech.volume),
            "Could not speak",
        )
    }

    fn attend_to(&mut self, object: &TrackedObject) -> Result<()> {
        let facing = self.face_point(object.position).map(|_| ());
        tolerate(facing, &format!("Not facing {}", object.label))?;

        let published = self.publish_point(object.position);
        tolerate(published, &format!("Not tracking {}", object.label))
    }
}

/// Outcome of a menu selection
enum Selection<T> {
    Chosen(T),
    Back,
    Closed,
}

/// Swallow recoverable errors after logging them
fn tolerate(result: Result<()>, context: &str) -> Result<()> {
    match result {
        Err(e) if e.is_recoverable() => {
            warn!("{}: {}", context, e);
            Ok(())
        }
        other => other,
    }
}

fn log_unavailable(e: SoundboardError) -> SoundboardError {
    if let SoundboardError::NavigationUnavailable(server) = &e {
        error!("Action server not available! ({})", server);
    }
    e
}

fn parse_index(answer: &str) -> Option<usize> {
    answer.parse().ok()
}

/// Read one trimmed line, `None` at end of input.
///
/// Bytes that are not UTF-8 are replaced, so they fail selection like any
/// other unknown answer.
fn read_line<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: Option<&str>,
) -> Result<Option<String>> {
    if let Some(prompt) = prompt {
        write!(out, "{}", prompt)?;
    }
    out.flush()?;

    let mut line = Vec::new();
    if input.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
}
