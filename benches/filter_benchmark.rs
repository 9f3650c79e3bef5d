use criterion::{criterion_group, criterion_main, Criterion};
use festival_locator::models::{LocationType, UserLocation, UserProfile};
use festival_locator::services::expiry::is_expired;
use festival_locator::services::filters::{
    apply_filters, FilterContext, GroupFilter, LocationFilters, TypeFilter,
};
use std::collections::HashMap;
use std::hint::black_box;

const USERS: usize = 2_000;
const LOCATIONS_PER_USER: usize = 5;

fn fixture() -> (Vec<UserLocation>, HashMap<String, UserProfile>) {
    let mut locations = Vec::with_capacity(USERS * LOCATIONS_PER_USER);
    let mut profiles = HashMap::with_capacity(USERS);

    for u in 0..USERS {
        let uid = format!("user-{u}");
        let mut profile = UserProfile::placeholder(&uid);
        profile.display_name = uid.clone();
        if u % 3 != 0 {
            profile.group_ids.push(format!("group-{}", u % 40));
        }
        profiles.insert(uid.clone(), profile);

        for i in 0..LOCATIONS_PER_USER {
            locations.push(UserLocation {
                id: format!("{uid}-{i}"),
                user_id: uid.clone(),
                x: (u * 7 % 1200) as f64,
                y: (i * 113 % 800) as f64,
                date: format!("2025-08-{:02}", 8 + (u + i) % 4),
                time: format!("{:02}:{:02}", 8 + (i * 3) % 14, (u % 4) * 15),
                end_time: None,
                comment: None,
                location: None,
                location_type: if i == 0 {
                    LocationType::Current
                } else {
                    LocationType::Scheduled
                },
                is_active: true,
                timestamp: String::new(),
            });
        }
    }
    (locations, profiles)
}

fn benchmark_filters(c: &mut Criterion) {
    let (locations, profiles) = fixture();
    let viewer = profiles.get("user-1");
    let ctx = FilterContext {
        viewer,
        profiles: &profiles,
    };

    let unfiltered = LocationFilters::default();
    let combined = LocationFilters {
        date: Some("2025-08-10".to_string()),
        location_type: TypeFilter::Only(LocationType::Scheduled),
        group: GroupFilter::SameGroup,
        ..Default::default()
    };
    let now = chrono::NaiveDate::from_ymd_opt(2025, 8, 10)
        .and_then(|d| d.and_hms_opt(12, 30, 0))
        .expect("valid timestamp");

    let mut group = c.benchmark_group("location_filters");

    group.bench_function("no_filters", |b| {
        b.iter(|| apply_filters(black_box(locations.clone()), &unfiltered, &ctx))
    });

    group.bench_function("date_type_group", |b| {
        b.iter(|| apply_filters(black_box(locations.clone()), &combined, &ctx))
    });

    group.bench_function("expiry_flags", |b| {
        b.iter(|| {
            locations
                .iter()
                .filter(|l| is_expired(black_box(l), now))
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_filters);
criterion_main!(benches);
