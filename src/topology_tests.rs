// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `topology.rs`

use super::*;

fn snapshot(records: &[(&str, [u8; 4])]) -> ZoneSnapshot {
    ZoneSnapshot {
        domain: "ocp.example.com".to_string(),
        records: records
            .iter()
            .map(|(name, ip)| ZoneRecord::new(*name, Ipv4Addr::from(*ip)))
            .collect(),
        name_servers: vec![Ipv4Addr::new(10, 0, 0, 2)],
    }
}

fn full_cluster(masters: usize, workers: usize) -> ZoneSnapshot {
    let mut records = vec![ZoneRecord::new("bootstrap", Ipv4Addr::new(10, 0, 0, 50))];
    for i in 0..masters {
        records.push(ZoneRecord::new(
            format!("master{i}"),
            Ipv4Addr::new(10, 0, 0, 10 + u8::try_from(i).unwrap()),
        ));
    }
    for i in 0..workers {
        records.push(ZoneRecord::new(
            format!("worker{i}"),
            Ipv4Addr::new(10, 0, 0, 20 + u8::try_from(i).unwrap()),
        ));
    }
    ZoneSnapshot {
        domain: "ocp.example.com".to_string(),
        records,
        name_servers: vec![Ipv4Addr::new(10, 0, 0, 2)],
    }
}

#[test]
fn test_rule_matches_exact_names() {
    let master = ROLE_RULES[1];
    assert_eq!(master.matches("master0"), Some(Some(0)));
    assert_eq!(master.matches("master12"), Some(Some(12)));
    assert_eq!(master.matches("master"), None);
    assert_eq!(master.matches("master01"), None);
    assert_eq!(master.matches("master0-lb"), None);
    assert_eq!(master.matches("xmaster0"), None);

    let bootstrap = ROLE_RULES[0];
    assert_eq!(bootstrap.matches("bootstrap"), Some(None));
    assert_eq!(bootstrap.matches("bootstrap-lb"), None);
}

#[test]
fn test_match_role() {
    assert_eq!(match_role("bootstrap"), Some((HostRole::Bootstrap, None)));
    assert_eq!(match_role("master3"), Some((HostRole::ControlPlane, Some(3))));
    assert_eq!(match_role("worker0"), Some((HostRole::Worker, Some(0))));
    assert_eq!(match_role("api"), None);
}

#[test]
fn test_classify_contiguous_cluster() {
    let result = classify(&full_cluster(3, 2), false).unwrap();

    assert_eq!(result.bootstrap.hostname, "bootstrap");
    assert_eq!(result.bootstrap.role_index, None);
    assert_eq!(result.control_plane.len(), 3);
    assert_eq!(result.worker.len(), 2);

    for (i, host) in result.control_plane.iter().enumerate() {
        assert_eq!(host.role, HostRole::ControlPlane);
        assert_eq!(host.role_index, Some(i));
        assert_eq!(host.hostname, format!("master{i}"));
    }
    for (i, host) in result.worker.iter().enumerate() {
        assert_eq!(host.role, HostRole::Worker);
        assert_eq!(host.role_index, Some(i));
    }
    assert_eq!(result.name_servers, vec![Ipv4Addr::new(10, 0, 0, 2)]);
}

#[test]
fn test_classify_record_order_is_irrelevant() {
    let mut shuffled = full_cluster(3, 3);
    shuffled.records.reverse();

    assert_eq!(
        classify(&shuffled, false).unwrap(),
        classify(&full_cluster(3, 3), false).unwrap()
    );
}

#[test]
fn test_classify_stops_at_first_gap() {
    // master2 is missing: master3 lies past the gap and is not discovered
    let snap = snapshot(&[
        ("bootstrap", [10, 0, 0, 50]),
        ("master0", [10, 0, 0, 10]),
        ("master1", [10, 0, 0, 11]),
        ("master3", [10, 0, 0, 13]),
        ("worker0", [10, 0, 0, 20]),
    ]);

    let result = classify(&snap, false).unwrap();

    assert_eq!(result.control_plane.len(), 2);
    assert!(result
        .control_plane
        .iter()
        .all(|h| h.hostname != "master3"));
}

#[test]
fn test_classify_missing_bootstrap() {
    let mut snap = full_cluster(3, 2);
    snap.records.retain(|r| r.name != "bootstrap");

    let err = classify(&snap, false).unwrap_err();

    assert_eq!(err.domain, "ocp.example.com");
    assert_eq!(err.missing, vec![HostRole::Bootstrap]);
    assert!(err.to_string().contains("bootstrap"));
}

#[test]
fn test_classify_missing_all_roles() {
    let snap = snapshot(&[("api", [10, 0, 0, 5])]);

    let err = classify(&snap, false).unwrap_err();

    assert_eq!(
        err.missing,
        vec![HostRole::Bootstrap, HostRole::ControlPlane, HostRole::Worker]
    );
    assert_eq!(
        err.to_string(),
        "Incomplete topology for domain 'ocp.example.com': missing bootstrap, master, worker"
    );
}

#[test]
fn test_classify_worker_sequence_must_start_at_zero() {
    let snap = snapshot(&[
        ("bootstrap", [10, 0, 0, 50]),
        ("master0", [10, 0, 0, 10]),
        ("worker1", [10, 0, 0, 21]),
    ]);

    let err = classify(&snap, false).unwrap_err();

    assert_eq!(err.missing, vec![HostRole::Worker]);
}

#[test]
fn test_classify_dual_nic_secondary_addresses() {
    let snap = snapshot(&[
        ("bootstrap", [10, 0, 0, 50]),
        ("bootstrap-lb", [10, 0, 1, 50]),
        ("master0", [10, 0, 0, 10]),
        ("master0-lb", [10, 0, 1, 10]),
        ("worker0", [10, 0, 0, 20]),
    ]);

    let result = classify(&snap, true).unwrap();

    assert_eq!(
        result.bootstrap.secondary_address,
        Some(Ipv4Addr::new(10, 0, 1, 50))
    );
    assert_eq!(
        result.control_plane[0].secondary_address,
        Some(Ipv4Addr::new(10, 0, 1, 10))
    );
    // No worker0-lb: single-homed, not an error
    assert_eq!(result.worker[0].secondary_address, None);
    assert_eq!(result.worker[0].addresses().len(), 1);
}

#[test]
fn test_classify_single_nic_ignores_lb_records() {
    let snap = snapshot(&[
        ("bootstrap", [10, 0, 0, 50]),
        ("bootstrap-lb", [10, 0, 1, 50]),
        ("master0", [10, 0, 0, 10]),
        ("worker0", [10, 0, 0, 20]),
    ]);

    let result = classify(&snap, false).unwrap();

    assert_eq!(result.bootstrap.secondary_address, None);
    assert_eq!(result.hosts().count(), 3);
}

#[test]
fn test_hosts_order() {
    let result = classify(&full_cluster(2, 2), false).unwrap();

    let names: Vec<_> = result.hosts().map(|h| h.hostname.as_str()).collect();
    assert_eq!(
        names,
        vec!["bootstrap", "master0", "master1", "worker0", "worker1"]
    );
}

#[test]
fn test_classify_flat_projection() {
    let flat = classify_flat(&full_cluster(3, 2)).unwrap();

    assert_eq!(
        flat.control_plane_addresses,
        vec![
            Ipv4Addr::new(10, 0, 0, 50),
            Ipv4Addr::new(10, 0, 0, 10),
            Ipv4Addr::new(10, 0, 0, 11),
            Ipv4Addr::new(10, 0, 0, 12),
        ]
    );
    assert_eq!(
        flat.worker_addresses,
        vec![Ipv4Addr::new(10, 0, 0, 20), Ipv4Addr::new(10, 0, 0, 21)]
    );
}

#[test]
fn test_classify_flat_same_completeness_check() {
    let mut snap = full_cluster(1, 1);
    snap.records.retain(|r| r.name != "worker0");

    let err = classify_flat(&snap).unwrap_err();

    assert_eq!(err.missing, vec![HostRole::Worker]);
}
