// Copyright 2026 the cardbox authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use crate::error::Fallible;
use crate::scheduler::Rating;
use crate::study::StudyContext;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Runs a review session in the terminal: shows each due card, reads a
/// rating, and cycles cards rated again or hard to the back of the queue.
/// The session ends when the queue is exhausted, on `q`, or at end of
/// input, and is folded into the day's statistics on every one of those
/// paths.
pub fn drill_deck(directory: &Path, file: Option<&Path>) -> Fallible<()> {
    let mut context = StudyContext::open(directory)?;
    let report = context.import(file)?;
    println!("{report}");
    let mut queue: VecDeque<Card> = context.due_cards(Timestamp::now())?.into();
    if queue.is_empty() {
        println!("No cards due.");
        return Ok(());
    }
    println!("{} cards due.", queue.len());

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    while let Some(card) = queue.pop_front() {
        println!();
        if let Some(label) = &card.context {
            println!("({label})");
        }
        println!("Q: {}", card.question);
        println!("[press enter to reveal, q to stop]");
        match read_input(&mut input)? {
            Some(line) if line != "q" => {}
            _ => break,
        }
        println!("A: {}", card.answer);
        let Some(rating) = read_rating(&mut input)? else {
            break;
        };
        let now = Timestamp::now();
        let was_new = context.reviewer().is_new(&card)?;
        context.reviewer().apply_rating(&card, rating, now)?;
        context.stats_mut().record_review(was_new, now)?;
        if matches!(rating, Rating::Again | Rating::Hard) {
            queue.push_back(card);
        }
    }

    if let Some(session) = context.stats_mut().end_session(Timestamp::now())? {
        println!();
        println!(
            "Session: {} cards in {} min ({} new, {} review).",
            session.cards_reviewed,
            session.duration_minutes().unwrap_or(0),
            session.new_cards,
            session.review_cards
        );
        let streak = context.stats().streak();
        println!("Streak: {} days (longest {}).", streak.current, streak.longest);
    }
    Ok(())
}

fn read_rating(input: &mut impl BufRead) -> Fallible<Option<Rating>> {
    loop {
        println!("Rate: (1 = again, 2 = hard, 3 = good, 4 = easy, q = stop)");
        match read_input(input)? {
            None => return Ok(None),
            Some(line) => match line.as_str() {
                "1" => return Ok(Some(Rating::Again)),
                "2" => return Ok(Some(Rating::Hard)),
                "3" => return Ok(Some(Rating::Good)),
                "4" => return Ok(Some(Rating::Easy)),
                "q" => return Ok(None),
                _ => println!("Please enter a number between 1 and 4, or q."),
            },
        }
    }
}

/// One trimmed line of input, or None at end of input.
fn read_input(input: &mut impl BufRead) -> Fallible<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
