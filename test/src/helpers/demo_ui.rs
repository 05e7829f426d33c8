use std::sync::Arc;

use trellis_server::{
    DataProvider, DataWindow, ItemFilter, ListDataProvider, Query, ServerConfig, UiSession,
};
use trellis_shared::{ComponentId, HasDescription, HasRequired};

use super::components::{Follower, Label, Layout, Listing, Notifier, Row, SumCalculator, TextField};

/// Ids of the components `demo_session` builds
#[derive(Clone, Copy, Debug)]
pub struct DemoIds {
    pub root: ComponentId,
    pub title: ComponentId,
    pub sum: ComponentId,
    pub name: ComponentId,
    pub notifier: ComponentId,
    pub follower: ComponentId,
    pub listing: ComponentId,
}

pub fn demo_rows(count: u32) -> Vec<Row> {
    (1..=count)
        .map(|id| Row {
            id,
            label: format!("Row {}", id),
        })
        .collect()
}

/// A small form: a title, a sum calculator, a text field, a notifier whose
/// finalization refreshes a follower, and a listing paging over `rows`
pub fn demo_session(config: &ServerConfig, rows: Arc<ListDataProvider<Row>>) -> (UiSession, DemoIds) {
    let mut session = UiSession::new(Layout::default(), config);
    let root = session.root();

    let title = session
        .attach(root, Label::new("Demo"))
        .expect("root is attached");
    let sum = session
        .attach(root, SumCalculator::new())
        .expect("root is attached");
    SumCalculator::register(&mut session, sum).expect("sum is attached");

    let mut name_field = TextField::new("Name");
    name_field.set_required(true);
    name_field.set_description("Your full name");
    let name = session.attach(root, name_field).expect("root is attached");
    TextField::register(&mut session, name).expect("name is attached");

    // follower comes first in pre-order so the notifier's marks cascade back
    let follower = session
        .attach(root, Follower::default())
        .expect("root is attached");
    let notifier = session
        .attach(root, Notifier::new(vec![follower]))
        .expect("root is attached");

    let provider: Arc<dyn DataProvider<Row, ItemFilter<Row>>> = rows;
    let window = DataWindow::new(provider, Query::new().with_limit(5));
    let listing = session
        .attach(root, Listing::new(window))
        .expect("root is attached");
    Listing::register(&mut session, listing).expect("listing is attached");

    let ids = DemoIds {
        root,
        title,
        sum,
        name,
        notifier,
        follower,
        listing,
    };
    (session, ids)
}
