//! Public sharing of collections.

use crate::interface::{Collection, Link, StacklinksError, Visibility};
use crate::working_set::WorkingSet;
use url::Url;

/// Read-only data behind a shared collection page
#[derive(Debug, Clone, PartialEq)]
pub struct PublicCollection {
    pub collection: Collection,
    /// Pinned first, private links removed
    pub links: Vec<Link>,
}

/// `<base>/public/<collection id>`. Only public collections can be shared.
pub fn share_url(base: &str, collection: &Collection) -> Result<Url, StacklinksError> {
    if collection.visibility != Visibility::Public {
        return Err(StacklinksError::Forbidden(format!(
            "collection {} is {}",
            collection.id,
            collection.visibility.as_str()
        )));
    }

    let mut url = Url::parse(base).map_err(|e| StacklinksError::InvalidInput(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| StacklinksError::InvalidInput(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .push("public")
        .push(&collection.id);
    Ok(url)
}

pub fn public_view(working_set: &WorkingSet, collection_id: &str) -> Result<PublicCollection, StacklinksError> {
    let collection = working_set
        .find_collection(collection_id)
        .filter(|c| c.visibility == Visibility::Public)
        .ok_or_else(|| StacklinksError::NotFound(format!("collection {collection_id}")))?;

    let links = working_set
        .links_in_collection(collection_id)
        .into_iter()
        .filter(|l| l.visibility != Visibility::Private)
        .collect();

    Ok(PublicCollection { collection, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{collection, link_in};

    #[test]
    fn test_share_url() {
        let c = collection("c1", "Reading");
        assert_eq!(
            share_url("https://stacklinks.app", &c).unwrap().as_str(),
            "https://stacklinks.app/public/c1"
        );
        assert_eq!(
            share_url("https://example.com/app/", &c).unwrap().as_str(),
            "https://example.com/app/public/c1"
        );
    }

    #[test]
    fn test_share_url_errors() {
        let mut c = collection("c1", "Reading");
        assert!(matches!(share_url("not a url", &c), Err(StacklinksError::InvalidInput(_))));
        assert!(matches!(share_url("mailto:me@example.com", &c), Err(StacklinksError::InvalidInput(_))));

        c.visibility = Visibility::Private;
        assert!(matches!(share_url("https://stacklinks.app", &c), Err(StacklinksError::Forbidden(_))));

        c.visibility = Visibility::Unlisted;
        assert!(matches!(share_url("https://stacklinks.app", &c), Err(StacklinksError::Forbidden(_))));
    }

    #[test]
    fn test_public_view_hides_private_links() {
        let ws = WorkingSet::new();
        let mut hidden = link_in("l2", "hidden", "c1");
        hidden.visibility = Visibility::Private;
        let mut pinned = link_in("l3", "pinned", "c1");
        pinned.pinned = true;
        ws.replace(
            "u1",
            vec![link_in("l1", "shown", "c1"), hidden, pinned, link_in("l4", "elsewhere", "c2")],
            vec![collection("c1", "Reading")],
        );

        let view = public_view(&ws, "c1").unwrap();
        let ids: Vec<&str> = view.links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l3", "l1"]);
    }

    #[test]
    fn test_public_view_missing_or_private() {
        let ws = WorkingSet::new();
        let mut secret = collection("c2", "Secret");
        secret.visibility = Visibility::Private;
        let mut unlisted = collection("c3", "Drafts");
        unlisted.visibility = Visibility::Unlisted;
        ws.replace("u1", vec![link_in("l1", "draft", "c3")], vec![secret, unlisted]);

        assert!(matches!(public_view(&ws, "c1"), Err(StacklinksError::NotFound(_))));
        assert!(matches!(public_view(&ws, "c2"), Err(StacklinksError::NotFound(_))));
        assert!(matches!(public_view(&ws, "c3"), Err(StacklinksError::NotFound(_))));
    }
}
