//! Account Hierarchy
//!
//! Parent/child helpers over a flat account snapshot. Depth is unbounded and
//! the server does not guarantee acyclic parent links, so every walk is
//! iterative and tracks visited ids.

use std::collections::{HashMap, HashSet};

use super::models::Account;

/// Direct children of `parent_id`, by name
pub fn children_of<'a>(accounts: &'a [Account], parent_id: &str) -> Vec<&'a Account> {
    let mut children: Vec<&Account> = accounts
        .iter()
        .filter(|a| a.parent_account_id.as_deref() == Some(parent_id))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

/// The account followed by its parents up to the top-level account
///
/// Stops at a missing parent or when a cycle would revisit an account.
pub fn ancestor_chain<'a>(accounts: &'a [Account], id: &str) -> Vec<&'a Account> {
    let by_id: HashMap<&str, &Account> = accounts.iter().map(|a| (a.id.as_str(), a)).collect();
    let mut seen = HashSet::new();
    let mut chain = Vec::new();

    let mut cursor = by_id.get(id).copied();
    while let Some(account) = cursor {
        if !seen.insert(account.id.as_str()) {
            break;
        }
        chain.push(account);
        cursor = account
            .parent_account_id
            .as_deref()
            .and_then(|pid| by_id.get(pid).copied());
    }
    chain
}

/// Accounts in depth-first display order with their depth
///
/// Accounts whose parent is not in the snapshot are treated as roots. So is
/// the first account (by name) of a parent cycle no root reaches; every
/// account appears exactly once.
pub fn flatten_accounts(accounts: &[Account]) -> Vec<(Account, usize)> {
    let known: HashSet<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
    let mut children_map: HashMap<Option<&str>, Vec<&Account>> = HashMap::new();
    for account in accounts {
        let parent = account
            .parent_account_id
            .as_deref()
            .filter(|pid| known.contains(pid));
        children_map.entry(parent).or_default().push(account);
    }
    for children in children_map.values_mut() {
        children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let mut by_name: Vec<&Account> = accounts.iter().collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name));
    let roots = children_map
        .get(&None)
        .into_iter()
        .flatten()
        .copied()
        .chain(by_name);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Vec::with_capacity(accounts.len());
    let mut stack: Vec<(&Account, usize)> = Vec::new();
    for root in roots {
        stack.push((root, 0));
        while let Some((account, depth)) = stack.pop() {
            if !seen.insert(account.id.as_str()) {
                continue;
            }
            result.push((account.clone(), depth));
            if let Some(children) = children_map.get(&Some(account.id.as_str())) {
                stack.extend(children.iter().rev().map(|&child| (child, depth + 1)));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_account(id: &str, name: &str, parent: Option<&str>) -> Account {
        let mut account = Account::new(id, name);
        account.parent_account_id = parent.map(str::to_string);
        account
    }

    #[test]
    fn test_children_sorted_by_name() {
        let accounts = vec![
            make_account("p", "Parent", None),
            make_account("c2", "Zeta", Some("p")),
            make_account("c1", "Alpha", Some("p")),
            make_account("x", "Other", None),
        ];

        let ids: Vec<&str> = children_of(&accounts, "p").iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_ancestor_chain_walks_to_root() {
        let accounts = vec![
            make_account("root", "Root", None),
            make_account("mid", "Mid", Some("root")),
            make_account("leaf", "Leaf", Some("mid")),
        ];

        let ids: Vec<&str> = ancestor_chain(&accounts, "leaf")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["leaf", "mid", "root"]);
        assert!(ancestor_chain(&accounts, "missing").is_empty());
    }

    #[test]
    fn test_ancestor_chain_stops_on_cycle() {
        let accounts = vec![
            make_account("a", "A", Some("b")),
            make_account("b", "B", Some("a")),
        ];

        assert_eq!(ancestor_chain(&accounts, "a").len(), 2);
    }

    #[test]
    fn test_flatten_orders_depth_first() {
        let accounts = vec![
            make_account("c1", "Child", Some("p")),
            make_account("p", "Parent", None),
            make_account("g1", "Grandchild", Some("c1")),
            make_account("orphan", "Orphan", Some("gone")),
        ];

        let flat: Vec<(String, usize)> = flatten_accounts(&accounts)
            .into_iter()
            .map(|(a, depth)| (a.id, depth))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("orphan".to_string(), 0),
                ("p".to_string(), 0),
                ("c1".to_string(), 1),
                ("g1".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_flatten_keeps_cycles_and_deep_chains() {
        let mut accounts = vec![
            make_account("top", "Top", None),
            make_account("b", "Beta", Some("a")),
            make_account("a", "Alpha", Some("b")),
            make_account("c", "Gamma", Some("b")),
        ];
        let flat: Vec<(String, usize)> = flatten_accounts(&accounts)
            .into_iter()
            .map(|(a, depth)| (a.id, depth))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("top".to_string(), 0),
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
            ]
        );

        accounts.clear();
        accounts.push(make_account("n0", "N0", None));
        for i in 1..100_000 {
            let parent = format!("n{}", i - 1);
            accounts.push(make_account(&format!("n{}", i), "N", Some(parent.as_str())));
        }
        let flat = flatten_accounts(&accounts);
        assert_eq!(flat.len(), 100_000);
        let (deepest, depth) = flat.last().unwrap();
        assert_eq!(deepest.id, "n99999");
        assert_eq!(*depth, 99_999);
    }
}
