/*
 * Userec
 * Copyright (C) 2026 The userec developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::process;

use getopts::Options;

use userec::clean;
use userec::errors::Result;
use userec::io;
use userec::types::UserItemMatrix;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if matches.free.len() != 2 {
        return print_usage_and_exit(
            &program,
            opts,
            Some(
                "Please provide the filepath of the user-item interactions dataset as the \
                 first argument and the filepath of the items dataset as the second.",
            ),
        );
    }

    let interactions_path = &matches.free[0];
    let items_path = &matches.free[1];

    if let Err(failure) = run_cleaning(interactions_path, items_path) {
        eprintln!("Cleaning failed: {}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} INTERACTIONS_CSV ITEMS_CSV [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn run_cleaning(interactions_path: &str, items_path: &str) -> Result<()> {
    println!(
        "Reading {} and {} to build the clean tables (pass 1/3)",
        interactions_path, items_path,
    );

    // Reusing a persisted mapping keeps ids stable across reruns.
    let mut anonymizer = io::load_or_new_mapping()?;

    let mut interaction_reader = io::csv_reader(interactions_path)?;
    let interactions = clean::clean_interactions(&mut interaction_reader, &mut anonymizer)?;

    let mut item_reader = io::csv_reader(items_path)?;
    let items = clean::clean_items(&mut item_reader)?;

    println!(
        "Found {} interactions between {} users and {} items.",
        interactions.num_interactions(),
        anonymizer.num_identifiers(),
        items.num_items(),
    );

    println!("Building the user-item presence matrix (pass 2/3)");
    let matrix = UserItemMatrix::from_interactions(&interactions);

    println!("Writing artifacts to {} (pass 3/3)", io::OUTPUT_DIR);
    io::save_artifacts(&interactions, &items, &matrix)?;
    io::save_mapping(&anonymizer)?;

    println!("Done.");

    Ok(())
}
