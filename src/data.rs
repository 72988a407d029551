//! Domain data for the recommendation pipeline: interaction events,
//! friendships, profile terms, and the weighted interaction matrix
//! derived from a snapshot of the application's state.
use std;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;

use ndarray::Array2;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use siphasher::sip::SipHasher;

use {ItemId, RecommendationError, Timestamp, UserId};

/// The kind of interaction a user had with an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The user viewed the item.
    View,
    /// The user liked the item.
    Like,
    /// The user commented on the item.
    Comment,
    /// The user applied to the item.
    Apply,
}

/// A single interaction event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    user_id: UserId,
    item_id: ItemId,
    kind: EventKind,
}

impl Event {
    /// Build a new event.
    pub fn new(user_id: UserId, item_id: ItemId, kind: EventKind) -> Self {
        Event {
            user_id: user_id,
            item_id: item_id,
            kind: kind,
        }
    }

    /// The interacting user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The item interacted with.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The kind of interaction.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// An accepted friendship between two users. Edges are unordered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FriendEdge {
    a: UserId,
    b: UserId,
}

impl FriendEdge {
    /// Build a new edge.
    pub fn new(a: UserId, b: UserId) -> Self {
        FriendEdge { a: a, b: b }
    }

    /// The user on the other end of the edge, if `user` is on it.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.a == user {
            Some(self.b)
        } else if self.b == user {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Profile attributes used for content scoring: skills, prior role
/// titles, and degree names.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    skills: Vec<String>,
    roles: Vec<String>,
    degrees: Vec<String>,
}

impl Profile {
    /// Build a profile from its term sources.
    pub fn new(skills: Vec<String>, roles: Vec<String>, degrees: Vec<String>) -> Self {
        Profile {
            skills: skills,
            roles: roles,
            degrees: degrees,
        }
    }

    /// The lowercased, deduplicated keyword set over all term sources,
    /// in first-occurrence order.
    pub fn keywords(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for term in self.skills
            .iter()
            .chain(self.roles.iter())
            .chain(self.degrees.iter())
        {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            if seen.insert(term.clone()) {
                keywords.push(term);
            }
        }

        keywords
    }
}

/// A user known to the snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    profile: Profile,
}

impl User {
    /// Build a new user.
    pub fn new(id: UserId, profile: Profile) -> Self {
        User {
            id: id,
            profile: profile,
        }
    }

    /// The user's identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// The user's profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

/// An item that can be recommended: a feed post or a job listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    owner: UserId,
    description: String,
    created_at: Timestamp,
}

impl Item {
    /// Build a new item.
    pub fn new(id: ItemId, owner: UserId, description: &str, created_at: Timestamp) -> Self {
        Item {
            id: id,
            owner: owner,
            description: description.to_owned(),
            created_at: created_at,
        }
    }

    /// The item's identifier.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The posting user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// The free-text description used for content scoring.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// The class of items served by one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    /// Social-feed posts.
    Post,
    /// Job listings.
    Listing,
}

impl ItemClass {
    /// Whether a friend's event of `kind` counts when propagating the
    /// friend signal onto the target user's row.
    pub fn qualifies_for_friend_signal(&self, kind: EventKind) -> bool {
        match *self {
            ItemClass::Post => kind == EventKind::Like || kind == EventKind::Comment,
            ItemClass::Listing => kind == EventKind::View || kind == EventKind::Apply,
        }
    }
}

/// Weight configuration for the interaction matrix: one weight per
/// event kind, plus the two friend-signal bonus tiers applied to the
/// target user's row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventWeights {
    /// Weight added per view event.
    pub view: f32,
    /// Weight added per like event.
    pub like: f32,
    /// Weight added per comment event.
    pub comment: f32,
    /// Weight added per application event.
    pub apply: f32,
    /// Bonus added when exactly one friend interacted with an item.
    pub single_friend_bonus: f32,
    /// Bonus added when more than one friend interacted with an item.
    pub multiple_friend_bonus: f32,
}

impl Default for EventWeights {
    fn default() -> Self {
        EventWeights {
            view: 1.0,
            like: 2.0,
            comment: 4.0,
            apply: 2.0,
            single_friend_bonus: 3.0,
            multiple_friend_bonus: 5.0,
        }
    }
}

impl EventWeights {
    /// The weight for one event kind.
    pub fn weight(&self, kind: EventKind) -> f32 {
        match kind {
            EventKind::View => self.view,
            EventKind::Like => self.like,
            EventKind::Comment => self.comment,
            EventKind::Apply => self.apply,
        }
    }
}

/// A request-scoped view of the world: all users, all items of one
/// class, the interaction events on those items, and the accepted
/// friendship edges.
///
/// Snapshots are assembled by the calling application from its own
/// storage; this crate only reads them.
#[derive(Clone, Debug)]
pub struct Snapshot {
    class: ItemClass,
    users: Vec<User>,
    items: Vec<Item>,
    events: Vec<Event>,
    friendships: Vec<FriendEdge>,
}

impl Snapshot {
    /// Build an empty snapshot for one item class.
    pub fn new(class: ItemClass) -> Self {
        Snapshot {
            class: class,
            users: Vec::new(),
            items: Vec::new(),
            events: Vec::new(),
            friendships: Vec::new(),
        }
    }

    /// The item class this snapshot serves.
    pub fn class(&self) -> ItemClass {
        self.class
    }

    /// All users, in row order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// All items, in column order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All interaction events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// All accepted friendship edges.
    pub fn friendships(&self) -> &[FriendEdge] {
        &self.friendships
    }

    /// Add a user.
    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Add an item.
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Add an interaction event.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Add an accepted friendship edge.
    pub fn add_friendship(&mut self, edge: FriendEdge) {
        self.friendships.push(edge);
    }

    /// Number of users.
    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    /// Number of items.
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// A copy of this snapshot carrying `events` instead of its own.
    /// Useful for evaluating on held-out event subsets.
    pub fn with_events(&self, events: Vec<Event>) -> Snapshot {
        Snapshot {
            class: self.class,
            users: self.users.clone(),
            items: self.items.clone(),
            events: events,
            friendships: self.friendships.clone(),
        }
    }

    /// The distinct friends of `user`.
    pub fn friends_of(&self, user: UserId) -> Vec<UserId> {
        let mut seen = HashSet::new();
        let mut friends = Vec::new();

        for edge in &self.friendships {
            if let Some(friend) = edge.other(user) {
                if friend != user && seen.insert(friend) {
                    friends.push(friend);
                }
            }
        }

        friends
    }

    /// Build the weighted interaction matrix for a request targeting
    /// `target_user`.
    ///
    /// Every event whose user and item belong to the snapshot adds its
    /// kind's weight to the corresponding cell. The friend signal is
    /// then propagated onto the target user's row only: for each item,
    /// the number of distinct friends with at least one qualifying
    /// event on it selects the single-friend or multiple-friends bonus.
    /// Events or edges referencing ids outside the snapshot are
    /// skipped.
    pub fn interaction_matrix(
        &self,
        target_user: UserId,
        weights: &EventWeights,
    ) -> Result<InteractionMatrix, RecommendationError> {
        let user_index: HashMap<UserId, usize> = self.users
            .iter()
            .enumerate()
            .map(|(row, user)| (user.id(), row))
            .collect();
        let item_index: HashMap<ItemId, usize> = self.items
            .iter()
            .enumerate()
            .map(|(column, item)| (item.id(), column))
            .collect();

        let target_row = *user_index
            .get(&target_user)
            .ok_or(RecommendationError::UserNotFound(target_user))?;

        let mut values = Array2::zeros((self.num_users(), self.num_items()));

        for event in &self.events {
            if let (Some(&row), Some(&column)) = (
                user_index.get(&event.user_id()),
                item_index.get(&event.item_id()),
            ) {
                values[[row, column]] += weights.weight(event.kind());
            }
        }

        // Friend propagation. Tiers depend on how many distinct friends
        // interacted, not on how many events each friend produced.
        let friends: HashSet<UserId> = self.friends_of(target_user).into_iter().collect();
        let mut interacting_friends: Vec<HashSet<UserId>> =
            vec![HashSet::new(); self.num_items()];

        for event in &self.events {
            if !friends.contains(&event.user_id()) {
                continue;
            }
            if !self.class.qualifies_for_friend_signal(event.kind()) {
                continue;
            }
            if let Some(&column) = item_index.get(&event.item_id()) {
                interacting_friends[column].insert(event.user_id());
            }
        }

        for (column, interacting) in interacting_friends.iter().enumerate() {
            match interacting.len() {
                0 => {}
                1 => values[[target_row, column]] += weights.single_friend_bonus,
                _ => values[[target_row, column]] += weights.multiple_friend_bonus,
            }
        }

        Ok(InteractionMatrix {
            values: values,
            user_ids: self.users.iter().map(|user| user.id()).collect(),
            item_ids: self.items.iter().map(|item| item.id()).collect(),
            user_index: user_index,
            item_index: item_index,
        })
    }
}

/// The dense user-by-item matrix of accumulated interaction weights.
///
/// Row and column order is the snapshot's user and item order,
/// established once per request. A cell is nonzero only if at least one
/// event or friend-propagated bonus exists for that pair; zero means
/// unobserved, not negative preference.
#[derive(Clone, Debug)]
pub struct InteractionMatrix {
    values: Array2<f32>,
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
}

impl InteractionMatrix {
    /// Number of user rows.
    pub fn num_users(&self) -> usize {
        self.values.nrows()
    }

    /// Number of item columns.
    pub fn num_items(&self) -> usize {
        self.values.ncols()
    }

    /// Matrix shape as `(num_users, num_items)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users(), self.num_items())
    }

    /// The accumulated weights.
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// User ids in row order.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Item ids in column order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// The row holding `user`, if present.
    pub fn row_of(&self, user: UserId) -> Option<usize> {
        self.user_index.get(&user).cloned()
    }

    /// The column holding `item`, if present.
    pub fn column_of(&self, item: ItemId) -> Option<usize> {
        self.item_index.get(&item).cloned()
    }

    /// The observed (nonzero) cells as `(row, column, value)` triplets
    /// in row-major order.
    pub fn to_triplets(&self) -> Vec<(usize, usize, f32)> {
        self.values
            .indexed_iter()
            .filter(|&(_, &value)| value > 0.0)
            .map(|((row, column), &value)| (row, column, value))
            .collect()
    }

    /// Whether the matrix has no observed cells at all.
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&value| value == 0.0)
    }
}

/// Split events into two user-disjoint sets: every user's events land
/// entirely in either the train or the test set, selected by a keyed
/// hash of the user id.
pub fn user_based_split<R: Rng>(
    events: &[Event],
    rng: &mut R,
    test_fraction: f32,
) -> (Vec<Event>, Vec<Event>) {
    let denominator = 100_000;
    let train_cutoff = (test_fraction * denominator as f32) as u64;

    let range = Uniform::new(0, std::u64::MAX);
    let (key_0, key_1) = (range.sample(rng), range.sample(rng));

    let is_train = |event: &Event| {
        let mut hasher = SipHasher::new_with_keys(key_0, key_1);
        hasher.write_usize(event.user_id());
        hasher.finish() % denominator > train_cutoff
    };

    let train = events.iter().filter(|x| is_train(x)).cloned().collect();
    let test = events.iter().filter(|x| !is_train(x)).cloned().collect();

    (train, test)
}
