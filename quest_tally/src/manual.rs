/*!

This is the long-form manual for `quest_tally` and `qtally`.

## Vote lines

A vote line starts with a marker in square brackets, optionally preceded by
dashes that give its depth:

```text
[x] Go north
-[x] Quietly
--[x] Through the forest
```

The following markers are recognized (spaces inside the brackets are ignored):
* `[x]`, `[X]`, `[✓]`, `[✔]` a plain vote
* `[1]` to `[9]`, or `[#1]` to `[#9]` a rank, 1 being the best
* `[+1]` to `[+9]` a score, 9 being the best. Scores are counted as ranks
  (a score of 9 is a rank of 1).
* `[+]` and `[-]` approval and disapproval
* `[*]` a continuation: the content is appended to the line above

A second bracket right after the marker names the task of the line:
`[x][Action] Go north`. Tasks are compared like the content of the line.

Lines that start with a bracket but cannot be read (`[x Go north`, `[10] Tea`)
are reported as failures of the post and do not count. Everything inside a
`[quote]...[/quote]` section is ignored.

### Equivalent lines

Two lines are the same vote if they have the same depth, the same task and the
same content once simplified. With the default comparison, content is compared
without case, without diacritics, without punctuation and with runs of
whitespace collapsed. BBCode markup (`[b]`, `[url=...]`, ...) never matters.
Both the case and the symbols can be made significant, see
[crate::agnostic::ComparisonConfig].

When `trimExtendedText` is set, any explanation after a colon or a dash in a
long line is dropped before comparing.

### Nominations

A post without any vote line, where every non-empty line is nothing but an
`@name` mention, is read as a vote for each of the named users. A reply such
as `@name thanks!` is not a nomination.

## Plans

A block whose first line reads `Plan Name` (or `Base Plan Name`) defines a plan
named `Name`:

```text
[x] Plan Shadow
-[x] Sneak in
-[x] Grab the ledger
```

Later voters can then vote for the whole plan with a single line,
`[x] Plan Shadow` or just `[x] Shadow`. The content of the plan replaces the
reference, so these voters end up supporting the same votes as the author.
Each plan also counts as a pseudo-voter named `◈Shadow`, shown but never
counted as a person.

Plans come in four kinds, from the weakest to the strongest:
* single line: a one-line `Plan Name` vote
* label: a post made only of flat lines, the first of which names the plan.
  The other lines become the content of the plan.
* content: a block naming a plan with indented lines
* base: a block whose first line starts with `Base Plan`

When two posts define a plan with the same name, the stronger kind wins. Posts
of the same kind with different content are kept as numbered variants
(`Shadow (2)`).

A plan may not take the name of a voter other than its author: such a line is
read as a reference to that voter instead (see `forbidPlanVoterNames`).

### Proxies

A single line whose content is the name of another voter copies the vote of
that voter, as it stood at that point of the thread. Ranked lines are never
proxies. Voters cannot proxy themselves.

Only the last vote of each voter counts.

## Partitioning

The lines of a vote are split into counted units according to the
partition mode:
* `none` the whole vote is one unit
* `byLine` every line is a unit. The naming line of a plan is dropped.
* `byBlock` (default) every top-level line and its children is a unit. Plans
  stay whole.
* `byBlockAll` like `byBlock`, and the content of plans is split into blocks
  as well

Ranked lines are always counted one by one.

## Ranked tasks

The ranks given to the options of a task are counted with one of the
following methods:
* `wilson` options ordered by the lower bound of the Wilson score of their
  ratings
* `baldwin` (default) repeated instant runoff, eliminating the option with the
  weakest rating at each round until one option has a majority
* `rirv` rated instant runoff: the two best rated options face each other in
  a head-to-head count
* `schulze` the Schulze method over the pairwise preferences of the voters

Each method returns every option exactly once, ranked from 1.

## Configuration

`qtally` reads a configuration file in JSON. All the keys are optional:

```text
{
  "questName": "The Long Road",
  "input": "posts.json",
  "inputType": "json",
  "output": "summary.json",
  "startPost": 120,
  "endPost": 180,
  "partitionMode": "byBlock",
  "rankCounter": "baldwin",
  "caseSensitive": false,
  "symbolsSignificant": false,
  "trimExtendedText": false,
  "forbidPlanVoterNames": true
}
```

Relative paths are resolved against the directory of the configuration file.
`startPost` and `endPost` restrict the tally to a range of post numbers
(both included). Each key has a command line option (`--input`, `--input-type`,
`--out`, `--start-post`, `--end-post`, `--partition-mode`, `--rank-counter`,
`--case-sensitive`, `--symbols-significant`, `--trim-extended-text`) that takes
precedence over the value of the file.

### Input formats

* `json` an array of posts:

```text
[
  {"author": "Kinematics", "postId": 4021, "number": 1, "text": "[x] Go north"}
]
```

* `text` a dump of the thread, each post starting with a header line
  `=== author #postId`. Posts are numbered in the order of the file.

```text
=== Kinematics #4021
[x] Go north
=== Xryuran #4022
[x] Go south
```

 */
