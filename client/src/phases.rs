//! The client's linear page sequence.
//!
//! Each phase owns its widgets and its message-handling policy. Phases
//! never mutate a shared page index: handlers return a [`Transition`] and
//! the [`App`] applies it, so every jump target is explicit at the call
//! site. Within one tick the outbound send always happens before the
//! single inbound poll, and at most one inbound envelope is consumed.

use crate::channel::Channel;
use crate::maze::{MazeCycle, MazeLayout};
use crate::sim::{DirectionKeys, Round};
use crate::widgets::{Button, Input, Text};
use log::debug;
use macroquad::color::{BLACK, GREEN, RED};
use macroquad::shapes::draw_rectangle;
use shared::Envelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseId {
    Start,
    AddressEntry,
    PortEntry,
    Interim,
    Lobby,
    Game,
    PostGame,
}

impl PhaseId {
    pub fn index(self) -> usize {
        match self {
            PhaseId::Start => 0,
            PhaseId::AddressEntry => 1,
            PhaseId::PortEntry => 2,
            PhaseId::Interim => 3,
            PhaseId::Lobby => 4,
            PhaseId::Game => 5,
            PhaseId::PostGame => 6,
        }
    }

    fn next(self) -> PhaseId {
        match self {
            PhaseId::Start => PhaseId::AddressEntry,
            PhaseId::AddressEntry => PhaseId::PortEntry,
            PhaseId::PortEntry => PhaseId::Interim,
            PhaseId::Interim => PhaseId::Lobby,
            PhaseId::Lobby => PhaseId::Game,
            PhaseId::Game => PhaseId::PostGame,
            PhaseId::PostGame => PhaseId::PostGame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Advance,
    Jump(PhaseId),
}

/// UI events sampled by the frontend once per frame.
#[derive(Debug, Clone, Copy)]
pub enum UiEvent {
    MouseDown { x: f32, y: f32 },
    Char(char),
    Backspace,
}

/// State that outlives any single phase.
pub struct SessionContext {
    pub channel: Channel,
    /// Host captured by the address page, consumed by the port page.
    pub host: String,
    /// Some(true): this client simulates pacman. Some(false): the ghost.
    pub controlling_pacman: Option<bool>,
    /// Score carried by the last `EndGame` envelope.
    pub last_score: u32,
    /// Informational line for the start page after a recovery jump.
    pub status_note: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            channel: Channel::new(),
            host: String::new(),
            controlling_pacman: None,
            last_score: 0,
            status_note: None,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Phase {
    /// Called once when the machine switches to this phase.
    fn on_enter(&mut self, _ctx: &mut SessionContext) {}

    /// Per-tick protocol logic. Outbound sends happen before the single
    /// inbound poll.
    fn tick(&mut self, ctx: &mut SessionContext, held: DirectionKeys) -> Transition;

    fn handle_event(&mut self, _ctx: &mut SessionContext, _event: &UiEvent) -> Transition {
        Transition::Stay
    }

    /// Widget composition only; no protocol work.
    fn draw(&self);
}

/// The shared recovery path: drop the channel (telling the server on the
/// way out) and return to the start page with an explanatory note.
fn peer_disconnected(ctx: &mut SessionContext) -> Transition {
    ctx.channel.disconnect();
    ctx.controlling_pacman = None;
    ctx.status_note = Some(String::from("Player disconnected"));
    Transition::Jump(PhaseId::Start)
}

pub struct StartPhase {
    title: Text,
    play: Button,
}

impl StartPhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "Pacman!"),
            play: Button::new(25.0, 200.0, 150.0, 60.0, "Play"),
        }
    }
}

impl Phase for StartPhase {
    fn tick(&mut self, ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        self.title.text = ctx
            .status_note
            .clone()
            .unwrap_or_else(|| String::from("Pacman!"));
        Transition::Stay
    }

    fn handle_event(&mut self, ctx: &mut SessionContext, event: &UiEvent) -> Transition {
        if let UiEvent::MouseDown { x, y } = event {
            if self.play.contains(*x, *y) {
                ctx.status_note = None;
                return Transition::Advance;
            }
        }
        Transition::Stay
    }

    fn draw(&self) {
        self.title.draw();
        self.play.draw();
    }
}

pub struct AddressEntryPhase {
    title: Text,
    input: Input,
    submit: Button,
}

impl AddressEntryPhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "Enter IP"),
            input: Input::new(25.0, 200.0),
            submit: Button::new(25.0, 300.0, 200.0, 60.0, "Submit"),
        }
    }
}

impl Phase for AddressEntryPhase {
    fn tick(&mut self, _ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        Transition::Stay
    }

    fn handle_event(&mut self, ctx: &mut SessionContext, event: &UiEvent) -> Transition {
        match event {
            UiEvent::Char(c) => self.input.push_char(*c),
            UiEvent::Backspace => self.input.backspace(),
            UiEvent::MouseDown { x, y } => {
                if self.submit.contains(*x, *y) {
                    ctx.host = self.input.text.clone();
                    self.input.clear();
                    return Transition::Advance;
                }
            }
        }
        Transition::Stay
    }

    fn draw(&self) {
        self.title.draw();
        self.input.draw();
        self.submit.draw();
    }
}

pub struct PortEntryPhase {
    title: Text,
    input: Input,
    submit: Button,
    retry: bool,
}

impl PortEntryPhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "Enter Port Number"),
            input: Input::new(25.0, 200.0),
            submit: Button::new(25.0, 300.0, 460.0, 60.0, "Submit"),
            retry: false,
        }
    }
}

impl Phase for PortEntryPhase {
    fn tick(&mut self, _ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        Transition::Stay
    }

    fn handle_event(&mut self, ctx: &mut SessionContext, event: &UiEvent) -> Transition {
        match event {
            // Typing is ignored while the page shows the retry prompt.
            UiEvent::Char(c) if !self.retry => self.input.push_char(*c),
            UiEvent::Backspace if !self.retry => self.input.backspace(),
            UiEvent::MouseDown { x, y } if self.submit.contains(*x, *y) => {
                if !self.retry {
                    let port = self.input.text.parse::<u16>();
                    self.input.clear();
                    // An unparsable port fails the same way a refused
                    // connection does.
                    let connected = match port {
                        Ok(port) => ctx.channel.connect(&ctx.host, port),
                        Err(_) => false,
                    };
                    if connected {
                        return Transition::Advance;
                    }
                    self.title.text = String::from("Incorrect Information");
                    self.submit.text = String::from("Click Here To Retry");
                    self.retry = true;
                } else {
                    self.retry = false;
                    self.title.text = String::from("Enter Port Number");
                    self.submit.text = String::from("Submit");
                    return Transition::Jump(PhaseId::AddressEntry);
                }
            }
            _ => {}
        }
        Transition::Stay
    }

    fn draw(&self) {
        self.title.draw();
        self.input.draw();
        self.submit.draw();
    }
}

pub struct InterimPhase {
    title: Text,
    request_sent: bool,
}

impl InterimPhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "Waiting for sync"),
            request_sent: false,
        }
    }
}

impl Phase for InterimPhase {
    fn tick(&mut self, ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        // One request per visit; the flag resets only on the grant or on a
        // disconnect so a slow server is not flooded.
        if !self.request_sent {
            ctx.channel.send(&Envelope::LobbyLoadRequest);
            self.request_sent = true;
        }

        match ctx.channel.receive() {
            Some(Envelope::LobbyLoadGranted) => {
                self.request_sent = false;
                Transition::Advance
            }
            Some(Envelope::Disconnect) => {
                self.request_sent = false;
                peer_disconnected(ctx)
            }
            Some(other) => {
                debug!("ignored while waiting for the lobby: {:?}", other);
                Transition::Stay
            }
            None => Transition::Stay,
        }
    }

    fn draw(&self) {
        self.title.draw();
    }
}

pub struct LobbyPhase {
    title: Text,
    pacman: Button,
    ghost: Button,
    local_pick_made: bool,
}

impl LobbyPhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "Pick your character"),
            pacman: Button::new(25.0, 150.0, 250.0, 60.0, "Pacman"),
            ghost: Button::new(25.0, 250.0, 250.0, 60.0, "Ghost"),
            local_pick_made: false,
        }
    }

    fn reset_markers(&mut self) {
        self.pacman.background = BLACK;
        self.pacman.active = false;
        self.ghost.background = BLACK;
        self.ghost.active = false;
        self.local_pick_made = false;
    }
}

impl Phase for LobbyPhase {
    fn on_enter(&mut self, _ctx: &mut SessionContext) {
        self.reset_markers();
    }

    fn tick(&mut self, ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        // Intentionally a busy-poll: the request is re-sent every tick until
        // the grant arrives, so a dropped frame costs one tick, not the
        // round. The server's barrier is idempotent under the retries.
        ctx.channel.send(&Envelope::GameLoadRequest);

        match ctx.channel.receive() {
            Some(Envelope::PacmanSelected) => {
                self.pacman.background = RED;
                self.pacman.active = true;
            }
            Some(Envelope::GhostSelected) => {
                self.ghost.background = RED;
                self.ghost.active = true;
            }
            Some(Envelope::StartGame) => {
                self.reset_markers();
                return Transition::Advance;
            }
            Some(Envelope::Disconnect) => return peer_disconnected(ctx),
            Some(other) => debug!("ignored in the lobby: {:?}", other),
            None => {}
        }
        Transition::Stay
    }

    fn handle_event(&mut self, ctx: &mut SessionContext, event: &UiEvent) -> Transition {
        let (x, y) = match event {
            UiEvent::MouseDown { x, y } => (*x, *y),
            _ => return Transition::Stay,
        };
        if self.pacman.contains(x, y) && !self.pacman.active && !self.local_pick_made {
            ctx.channel.send(&Envelope::PacmanSelected);
            self.pacman.background = GREEN;
            self.pacman.active = true;
            ctx.controlling_pacman = Some(true);
            self.local_pick_made = true;
        } else if self.ghost.contains(x, y) && !self.ghost.active && !self.local_pick_made {
            ctx.channel.send(&Envelope::GhostSelected);
            self.ghost.background = GREEN;
            self.ghost.active = true;
            ctx.controlling_pacman = Some(false);
            self.local_pick_made = true;
        }
        Transition::Stay
    }

    fn draw(&self) {
        self.title.draw();
        self.pacman.draw();
        self.ghost.draw();
    }
}

pub struct GamePhase {
    mazes: MazeCycle,
    round: Round,
    score_label: Text,
    player_label: Text,
}

impl GamePhase {
    /// The board stays a placeholder until `on_enter` takes the first
    /// layout from the cycle.
    pub fn new(mazes: MazeCycle) -> Self {
        Self {
            mazes,
            round: Round::new(&MazeLayout::default()),
            score_label: Text::new(50.0, 300.0, "Score = 0"),
            player_label: Text::new(50.0, 350.0, "Playing as ?"),
        }
    }
}

impl Phase for GamePhase {
    fn on_enter(&mut self, _ctx: &mut SessionContext) {
        // A fresh board and score for every round.
        let layout = self.mazes.next();
        self.round = Round::new(&layout);
    }

    fn tick(&mut self, ctx: &mut SessionContext, held: DirectionKeys) -> Transition {
        let local_is_pacman = ctx.controlling_pacman.unwrap_or(false);

        // Only the locally-controlled sprite is simulated; the other is
        // whatever the network last said.
        self.round.step_local(local_is_pacman, held);
        let outgoing = if local_is_pacman {
            let (x, y) = self.round.pacman.pos();
            Envelope::PacmanCoordinates { x, y }
        } else {
            let (x, y) = self.round.ghost.pos();
            Envelope::GhostCoordinates { x, y }
        };
        ctx.channel.send(&outgoing);

        match ctx.channel.receive() {
            Some(Envelope::PacmanCoordinates { x, y }) => self.round.apply_remote_pacman(x, y),
            Some(Envelope::GhostCoordinates { x, y }) => self.round.apply_remote_ghost(x, y),
            Some(Envelope::EndGame { score }) => {
                ctx.last_score = score;
                ctx.controlling_pacman = None;
                return Transition::Advance;
            }
            Some(Envelope::Disconnect) => return peer_disconnected(ctx),
            Some(other) => debug!("ignored mid-round: {:?}", other),
            None => {}
        }

        self.score_label.text = format!("Score = {}", self.round.score);
        self.player_label.text = String::from(match ctx.controlling_pacman {
            Some(true) => "Controlling Pacman",
            Some(false) => "Controlling Ghost",
            None => "Playing as ?",
        });

        // Both end conditions are checked every tick no matter what came
        // in. The catch is reported to the server and comes back as the
        // EndGame broadcast that moves both clients on.
        if self.round.ghost_caught_pacman() {
            ctx.channel.send(&Envelope::EndGame {
                score: self.round.score,
            });
        }
        if self.round.pellets_remaining() == 0 {
            let layout = self.mazes.next();
            self.round.regenerate(&layout);
        }

        Transition::Stay
    }

    fn draw(&self) {
        for wall in self.round.walls() {
            draw_entity(wall);
        }
        for pellet in self.round.pellets() {
            draw_entity(pellet);
        }
        draw_entity(&self.round.pacman.entity);
        draw_entity(&self.round.ghost.entity);
        self.score_label.draw();
        self.player_label.draw();
    }
}

fn draw_entity(entity: &crate::sim::Entity) {
    draw_rectangle(
        entity.rect.x as f32,
        entity.rect.y as f32,
        entity.rect.w as f32,
        entity.rect.h as f32,
        entity.color,
    );
}

pub struct PostGamePhase {
    title: Text,
    score_label: Text,
    submit: Button,
}

impl PostGamePhase {
    pub fn new() -> Self {
        Self {
            title: Text::new(25.0, 50.0, "GAME OVER"),
            score_label: Text::new(25.0, 100.0, "Score"),
            submit: Button::new(25.0, 250.0, 250.0, 60.0, "Play again"),
        }
    }
}

impl Phase for PostGamePhase {
    fn tick(&mut self, ctx: &mut SessionContext, _held: DirectionKeys) -> Transition {
        self.score_label.text = format!("Score = {}", ctx.last_score);
        match ctx.channel.receive() {
            Some(Envelope::Disconnect) => peer_disconnected(ctx),
            Some(other) => {
                debug!("ignored after the round: {:?}", other);
                Transition::Stay
            }
            None => Transition::Stay,
        }
    }

    fn handle_event(&mut self, _ctx: &mut SessionContext, event: &UiEvent) -> Transition {
        if let UiEvent::MouseDown { x, y } = event {
            if self.submit.contains(*x, *y) {
                // The channel is still open, so the next round skips the
                // address and port pages.
                return Transition::Jump(PhaseId::Interim);
            }
        }
        Transition::Stay
    }

    fn draw(&self) {
        self.title.draw();
        self.score_label.draw();
        self.submit.draw();
    }
}

/// Owns the phase list and the session context; routes ticks, events and
/// draws to the active phase and applies returned transitions.
pub struct App {
    ctx: SessionContext,
    phases: Vec<Box<dyn Phase>>,
    current: PhaseId,
}

impl App {
    pub fn new() -> Self {
        let phases: Vec<Box<dyn Phase>> = vec![
            Box::new(StartPhase::new()),
            Box::new(AddressEntryPhase::new()),
            Box::new(PortEntryPhase::new()),
            Box::new(InterimPhase::new()),
            Box::new(LobbyPhase::new()),
            Box::new(GamePhase::new(MazeCycle::standard())),
            Box::new(PostGamePhase::new()),
        ];
        Self {
            ctx: SessionContext::new(),
            phases,
            current: PhaseId::Start,
        }
    }

    pub fn current_phase(&self) -> PhaseId {
        self.current
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn tick(&mut self, held: DirectionKeys) {
        let transition = self.phases[self.current.index()].tick(&mut self.ctx, held);
        self.apply(transition);
    }

    pub fn handle_event(&mut self, event: &UiEvent) {
        let transition = self.phases[self.current.index()].handle_event(&mut self.ctx, event);
        self.apply(transition);
    }

    pub fn draw(&self) {
        self.phases[self.current.index()].draw();
    }

    /// Best-effort goodbye on user exit.
    pub fn shutdown(&mut self) {
        self.ctx.channel.disconnect();
    }

    fn apply(&mut self, transition: Transition) {
        let target = match transition {
            Transition::Stay => return,
            Transition::Advance => self.current.next(),
            Transition::Jump(id) => id,
        };
        self.current = target;
        self.phases[target.index()].on_enter(&mut self.ctx);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
