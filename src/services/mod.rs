/// Inbound event routing onto the room state.
pub mod dispatch;
/// Host actions: quiz rotation, judgments, Free Mode.
pub mod host_service;
/// Emission wrapper turning transport failures into notices.
pub mod outbound;
/// Player actions: buzz and answer submission.
pub mod player_service;

use std::{rc::Rc, sync::Arc};

use crate::{
    config::ClientConfig,
    state::{
        ClientState, SharedClient,
        game::Quiz,
        session::{Roster, Session},
    },
    transport::EventChannel,
};

/// Build the client core and subscribe it to every inbound event kind.
pub fn connect(
    session: Session,
    roster: Arc<dyn Roster>,
    channel: Rc<dyn EventChannel>,
    catalog: Vec<Quiz>,
    config: Arc<ClientConfig>,
) -> SharedClient {
    let client = ClientState::new(session, roster, channel, catalog, config);
    dispatch::attach(&client);
    client
}
