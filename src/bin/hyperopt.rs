extern crate linkrec;
extern crate rand;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;

use std::fs::File;
use std::time::Instant;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use linkrec::data::{user_based_split, Event, EventKind, EventWeights, Item, ItemClass, Profile,
                    Snapshot, User};
use linkrec::evaluation::mrr_score;
use linkrec::models::factorization::Hyperparameters;

#[derive(Debug, Serialize, Deserialize)]
struct Trial {
    test_mrr: f32,
    elapsed_secs: f64,
    latent_dim: usize,
    num_steps: usize,
    learning_rate: f32,
}

fn synthetic_snapshot(num_users: usize, num_items: usize) -> Snapshot {
    let mut rng = rand::thread_rng();
    let mut snapshot = Snapshot::new(ItemClass::Listing);

    for user_id in 0..num_users {
        snapshot.add_user(User::new(user_id, Profile::default()));
    }
    for item_id in 0..num_items {
        snapshot.add_item(Item::new(item_id, 0, "Synthetic listing", 0));
    }

    for user_id in 0..num_users {
        for _ in 0..rng.gen_range(1, 6) {
            let item_id = rng.gen_range(0, num_items);
            snapshot.add_event(Event::new(user_id, item_id, EventKind::View));
        }
        // A stable preferred item per user gives the model something
        // recoverable to learn.
        snapshot.add_event(Event::new(user_id, (user_id * 7) % num_items, EventKind::Apply));
    }

    snapshot
}

fn main() {
    let mut rng = rand::thread_rng();

    let snapshot = synthetic_snapshot(60, 40);
    let (train_events, test_events) = user_based_split(snapshot.events(), &mut rng, 0.2);
    let train = snapshot.with_events(train_events);

    let target = train.users()[0].id();
    let matrix = train
        .interaction_matrix(target, &EventWeights::default())
        .unwrap();

    println!("Users {} items {}", matrix.num_users(), matrix.num_items());

    for _ in 0..100 {
        let mut results: Vec<Trial> = File::open("hyperopt_results.json")
            .map(|file| serde_json::from_reader(&file).unwrap())
            .unwrap_or(Vec::new());

        let latent_dim = 2_usize.pow(Uniform::new(2, 6).sample(&mut rng));
        let num_steps = 2_usize.pow(Uniform::new(7, 11).sample(&mut rng));
        let learning_rate = (10.0_f32).powf(Uniform::new(-3.5_f32, -2.0).sample(&mut rng));

        println!(
            "Running dim {} steps {} rate {}",
            latent_dim, num_steps, learning_rate
        );

        let hyper = Hyperparameters::new()
            .latent_dim(latent_dim)
            .num_steps(num_steps)
            .learning_rate(learning_rate);

        let start = Instant::now();
        let model = hyper.fit(&matrix).unwrap();
        let elapsed = start.elapsed();

        let trial = Trial {
            test_mrr: mrr_score(&model, &test_events, matrix.item_ids()).unwrap(),
            elapsed_secs: elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9,
            latent_dim: latent_dim,
            num_steps: num_steps,
            learning_rate: learning_rate,
        };

        println!("{:#?}", trial);

        if !trial.test_mrr.is_nan() {
            results.push(trial);
            results.sort_by(|x, y| x.test_mrr.partial_cmp(&y.test_mrr).unwrap());
        }

        println!("Best so far: {:#?}", results.last());

        File::create("hyperopt_results.json")
            .map(|file| serde_json::to_writer_pretty(&file, &results).unwrap())
            .unwrap();
    }
}
