//! Single ordered event queue.
//!
//! The [`Dispatcher`] owns every stateful piece (supervisor, workflow,
//! collaborator, settings store) and processes one [`QueueEvent`] at a
//! time to completion, including any sends and the awaited insertion
//! sequence, before the next event is looked at. Transport events,
//! user intents and reconnect timers all arrive on the same queue.
//!
//! User-visible effects (notices, status lines, the settings prompt) are
//! forwarded on the output channel as they happen. Insertion progress is
//! fed to the workflow slide by slide, so its status and the output both
//! update while the insertion is still running.

use std::collections::VecDeque;

use classdeck_collab::{
    ClientConfig, ReconnectSupervisor, SettingsStore, SupervisorSignal, Transport, TransportEvent,
};
use classdeck_core::Settings;
use tokio::sync::mpsc;

use crate::bridge::{insert_slides, PresentationCollaborator};
use crate::engine::{RequestIdentity, Workflow};
use crate::event::{Effect, Event, Intent, NoticeLevel};

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Transport(TransportEvent),
    User(Intent),
    /// A reconnect timer armed for `token` elapsed.
    Timer(u64),
}

impl From<TransportEvent> for QueueEvent {
    fn from(event: TransportEvent) -> Self {
        QueueEvent::Transport(event)
    }
}

impl From<Intent> for QueueEvent {
    fn from(intent: Intent) -> Self {
        QueueEvent::User(intent)
    }
}

pub struct Dispatcher<T, C, S>
where
    T: Transport,
    C: PresentationCollaborator,
    S: SettingsStore,
{
    supervisor: ReconnectSupervisor<T>,
    workflow: Workflow,
    collaborator: C,
    store: S,
    settings_key: String,
    queue: mpsc::UnboundedSender<QueueEvent>,
    output: mpsc::UnboundedSender<Effect>,
}

impl<T, C, S> Dispatcher<T, C, S>
where
    T: Transport,
    C: PresentationCollaborator,
    S: SettingsStore,
{
    /// Build a dispatcher, loading the settings saved for `document`.
    ///
    /// `queue` must feed back into the loop that calls [`dispatch`];
    /// reconnect timers post their [`QueueEvent::Timer`] on it.
    ///
    /// [`dispatch`]: Dispatcher::dispatch
    pub fn new(
        config: &ClientConfig,
        transport: T,
        collaborator: C,
        store: S,
        document: Option<&str>,
        queue: mpsc::UnboundedSender<QueueEvent>,
        output: mpsc::UnboundedSender<Effect>,
    ) -> Self {
        let settings_key = Settings::storage_key(document);
        let settings = match store.load(&settings_key) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Could not load settings {settings_key}: {e}");
                None
            }
        };
        if settings.is_none() {
            let _ = output.send(Effect::PromptSettings);
        }
        Self {
            supervisor: ReconnectSupervisor::new(transport, config.reconnect_policy()),
            workflow: Workflow::new(RequestIdentity::from(config), settings),
            collaborator,
            store,
            settings_key,
            queue,
            output,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn supervisor(&self) -> &ReconnectSupervisor<T> {
        &self.supervisor
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    pub fn connect(&mut self) {
        self.supervisor.connect();
    }

    /// Close the connection intentionally.
    pub fn shutdown(&mut self) {
        self.supervisor.close();
    }

    pub async fn dispatch(&mut self, event: QueueEvent) {
        let effects = match event {
            QueueEvent::Transport(event) => match self.supervisor.handle(event) {
                Some(signal) => self.on_signal(signal),
                None => Vec::new(),
            },
            QueueEvent::Timer(token) => {
                self.supervisor.on_timer(token);
                Vec::new()
            }
            QueueEvent::User(intent) => self.feed(Event::User(intent)),
        };
        self.run_effects(effects).await;
    }

    fn on_signal(&mut self, signal: SupervisorSignal) -> Vec<Effect> {
        match signal {
            SupervisorSignal::Connected => self.feed(Event::Connected),
            SupervisorSignal::Message(text) => self.feed(Event::MessageReceived(text)),
            SupervisorSignal::RetryScheduled { attempt, delay, token } => {
                let queue = self.queue.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = queue.send(QueueEvent::Timer(token));
                });
                vec![Effect::Status(format!("Reconnecting (attempt {attempt})..."))]
            }
            SupervisorSignal::Disconnected { .. } => Vec::new(),
            SupervisorSignal::ConnectionLost => self.feed(Event::ConnectionLost),
        }
    }

    fn feed(&mut self, event: Event) -> Vec<Effect> {
        self.workflow.handle(event, self.supervisor.state())
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Connect => {
                    self.supervisor.connect();
                }
                Effect::Send(message) => {
                    if let Err(e) = self.supervisor.send_message(&message) {
                        log::warn!("Send failed: {e}");
                        pending.extend(self.feed(Event::SendFailed));
                    }
                }
                Effect::Insert(slides) => {
                    let connection = self.supervisor.state();
                    let workflow = &mut self.workflow;
                    let output = &self.output;
                    let progress = |current: usize, total: usize| {
                        let event = Event::InsertProgress { current, total };
                        for effect in workflow.handle(event, connection) {
                            let _ = output.send(effect);
                        }
                    };
                    let result = insert_slides(&mut self.collaborator, &slides, progress).await;
                    pending.extend(self.feed(Event::InsertFinished(result)));
                }
                Effect::PersistSettings(settings) => {
                    if let Err(e) = self.store.save(&self.settings_key, &settings) {
                        log::error!("Failed to save settings: {e}");
                        self.emit(Effect::Notice {
                            level: NoticeLevel::Error,
                            text: format!("Failed to save settings: {e}"),
                        });
                    }
                }
                visible => self.emit(visible),
            }
        }
    }

    fn emit(&self, effect: Effect) {
        let _ = self.output.send(effect);
    }
}
