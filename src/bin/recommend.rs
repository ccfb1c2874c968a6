use std::env;
use std::process;

use getopts::Options;

use userec::recommend;

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
            Some("Please provide a user id and the number of recommendations to produce."),
        );
    }

    let user_id: u32 = match matches.free[0].parse() {
        Ok(user_id) => user_id,
        Err(_) => {
            let hint = format!("'{}' is not a valid user id.", matches.free[0]);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let num_recommendations: usize = match matches.free[1].parse() {
        Ok(count) => count,
        Err(_) => {
            let hint = format!("'{}' is not a valid recommendation count.", matches.free[1]);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let (interactions, _items, matrix) = match userec::io::load_artifacts() {
        Ok(artifacts) => artifacts,
        Err(failure) => {
            eprintln!("{}", failure);
            process::exit(1);
        }
    };

    if !recommend::is_known_user(user_id, &interactions) {
        eprintln!(
            "User {} has no recorded interactions, falling back to the most viewed items.",
            user_id,
        );
    }

    let recommendations = recommend::recommend(user_id, num_recommendations, &interactions, &matrix);

    println!(
        "Top {} recommendations for user {}:",
        num_recommendations, user_id,
    );
    for (index, title) in recommendations.titles.iter().enumerate() {
        println!("{}. {}", index + 1, title);
    }
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} USER_ID NUM_RECOMMENDATIONS [options]", program);
    eprint!("{}", opts.usage(&brief));
}
