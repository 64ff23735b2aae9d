use eb_engine::check_share_is_valid;
use eb_peer::{AddShare, PeerContainer};
use eb_session::SessionStore;
use eb_types::{ShareAddress, SyncServerUrl};
use tracing::info;
use url::Url;

use crate::error::{InviteError, InviteResult};

/// URL scheme of an invitation.
pub const INVITATION_SCHEME: &str = "earthstar";

/// The only invitation format version understood.
pub const INVITATION_VERSION: &str = "1";

/// A decoded invitation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invitation {
    pub share: ShareAddress,
    /// Suggested sync servers, in invitation order.
    pub servers: Vec<SyncServerUrl>,
}

impl Invitation {
    /// Attach the share to the peer, then add the invitation's servers, minus
    /// `excluded`, to the session's sync-server list.
    pub fn redeem(&self, container: &PeerContainer, excluded: &[SyncServerUrl]) -> AddShare {
        let outcome = container.add_share(&self.share);
        let incoming: Vec<SyncServerUrl> = self
            .servers
            .iter()
            .filter(|server| !excluded.contains(server))
            .cloned()
            .collect();
        merge_servers(container.session(), &incoming);
        info!(
            share = %self.share,
            servers = incoming.len(),
            attached = outcome.is_attached(),
            "invitation redeemed"
        );
        outcome
    }
}

fn merge_servers(session: &SessionStore, incoming: &[SyncServerUrl]) {
    session.update_sync_servers(|current| {
        let mut merged = current.to_vec();
        merged.extend(incoming.iter().cloned());
        merged
    });
}

/// Parse an invitation URL.
///
/// Checks run in order: URL syntax, scheme, version, presence of the share,
/// share validity, then each sync-server URL. The first failure is returned.
pub fn decode(invitation: &str) -> InviteResult<Invitation> {
    let url = Url::parse(invitation).map_err(|_| InviteError::NotAUrl)?;
    if url.scheme() != INVITATION_SCHEME {
        return Err(InviteError::NotAnInvitation);
    }

    let mut version = None;
    let mut workspace = None;
    let mut pubs = Vec::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "v" if version.is_none() => version = Some(value.into_owned()),
            "workspace" if workspace.is_none() => workspace = Some(value.into_owned()),
            "pub" => pubs.push(value.into_owned()),
            _ => {}
        }
    }

    if version.as_deref() != Some(INVITATION_VERSION) {
        return Err(InviteError::UnsupportedVersion);
    }
    let workspace = workspace.ok_or(InviteError::MissingShare)?;

    // Query decoding turns a literal `+` into a space.
    let address = workspace.replacen(' ', "+", 1);
    check_share_is_valid(&address)?;
    let share = ShareAddress::new(address).map_err(|_| InviteError::MissingShare)?;

    let servers = pubs
        .into_iter()
        .map(|raw| SyncServerUrl::parse(raw).map_err(|_| InviteError::MalformedServerUrl))
        .collect::<InviteResult<Vec<_>>>()?;

    Ok(Invitation { share, servers })
}

/// Build the invitation URL for `share` and `servers`.
pub fn encode(servers: &[SyncServerUrl], share: &ShareAddress) -> String {
    let mut out = format!("{INVITATION_SCHEME}:///?workspace={share}");
    for server in servers {
        out.push_str("&pub=");
        out.push_str(&escape_value(server.as_str()));
    }
    out.push_str("&v=");
    out.push_str(INVITATION_VERSION);
    out
}

/// Invitation to `share`, or to the session's selection when `share` is
/// `None`, carrying the known servers listed in `included`.
pub fn make_invitation(
    session: &SessionStore,
    included: &[SyncServerUrl],
    share: Option<&ShareAddress>,
) -> InviteResult<String> {
    let share = match share {
        Some(share) => share.clone(),
        None => session.current_share().ok_or(InviteError::NothingToInvite)?,
    };
    let servers: Vec<SyncServerUrl> = session
        .sync_servers()
        .into_iter()
        .filter(|server| included.contains(server))
        .collect();
    Ok(encode(&servers, &share))
}

/// Escape the characters that would otherwise end or alter a query value.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '+' => out.push_str("%2B"),
            ' ' => out.push_str("%20"),
            c => out.push(c),
        }
    }
    out
}
